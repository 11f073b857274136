#![allow(dead_code)]

use chirpy::auth::responses::LoginResponse;
use chirpy::models::{Chirp, UserResponse};
use rocket::http::{Header, Status};
use rocket::local::blocking::Client;
use serde_json::json;

pub const PASSWORD: &str = "04234";

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

pub fn api_key(key: &str) -> Header<'static> {
    Header::new("Authorization", format!("ApiKey {key}"))
}

pub fn create_user(client: &Client, email: &str) -> UserResponse {
    let response = client
        .post("/api/users")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    response.into_json().expect("user payload")
}

pub fn login(client: &Client, email: &str) -> LoginResponse {
    let response = client
        .post("/api/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_json().expect("login payload")
}

/// Register and log in, returning the session.
pub fn sign_up(client: &Client, email: &str) -> LoginResponse {
    create_user(client, email);
    login(client, email)
}

pub fn post_chirp(client: &Client, token: &str, body: &str) -> Chirp {
    let response = client
        .post("/api/chirps")
        .header(bearer(token))
        .json(&json!({ "body": body }))
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    response.into_json().expect("chirp payload")
}

pub fn error_message(response: rocket::local::blocking::LocalResponse<'_>) -> String {
    let body: serde_json::Value = response.into_json().expect("error payload");
    body["error"].as_str().expect("error message").to_string()
}
