mod common;

use chirpy::test_support::{TEST_POLKA_KEY, TestRocketBuilder};
use common::{api_key, bearer, create_user, error_message, login};
use rocket::http::Status;
use serde_json::json;
use uuid::Uuid;

#[test]
fn upgrade_event_marks_user_as_chirpy_red() {
    let client = TestRocketBuilder::new().blocking_client();
    let user = create_user(&client, "walt@breakingbad.com");
    assert!(!user.is_chirpy_red);

    let response = client
        .post("/api/polka/webhooks")
        .header(api_key(TEST_POLKA_KEY))
        .json(&json!({ "event": "user.upgraded", "data": { "user_id": user.id } }))
        .dispatch();
    assert_eq!(response.status(), Status::NoContent);

    let session = login(&client, "walt@breakingbad.com");
    assert!(session.user.is_chirpy_red);
}

#[test]
fn other_events_are_acknowledged_and_ignored() {
    let client = TestRocketBuilder::new().blocking_client();
    let user = create_user(&client, "walt@breakingbad.com");

    let response = client
        .post("/api/polka/webhooks")
        .header(api_key(TEST_POLKA_KEY))
        .json(&json!({ "event": "user.payment_failed", "data": { "user_id": user.id } }))
        .dispatch();
    assert_eq!(response.status(), Status::NoContent);

    let session = login(&client, "walt@breakingbad.com");
    assert!(!session.user.is_chirpy_red);
}

#[test]
fn other_events_need_no_user() {
    let client = TestRocketBuilder::new().blocking_client();

    for payload in [
        json!({ "event": "user.payment_failed", "data": {} }),
        json!({ "event": "user.payment_failed" }),
    ] {
        let response = client
            .post("/api/polka/webhooks")
            .header(api_key(TEST_POLKA_KEY))
            .json(&payload)
            .dispatch();
        assert_eq!(response.status(), Status::NoContent);
    }
}

#[test]
fn upgrade_without_user_is_rejected() {
    let client = TestRocketBuilder::new().blocking_client();

    let response = client
        .post("/api/polka/webhooks")
        .header(api_key(TEST_POLKA_KEY))
        .json(&json!({ "event": "user.upgraded", "data": {} }))
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_message(response), "Missing user_id");
}

#[test]
fn unknown_user_is_not_found() {
    let client = TestRocketBuilder::new().blocking_client();

    let response = client
        .post("/api/polka/webhooks")
        .header(api_key(TEST_POLKA_KEY))
        .json(&json!({ "event": "user.upgraded", "data": { "user_id": Uuid::new_v4() } }))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);
}

#[test]
fn requires_the_configured_api_key() {
    let client = TestRocketBuilder::new().blocking_client();
    let user = create_user(&client, "walt@breakingbad.com");
    let payload = json!({ "event": "user.upgraded", "data": { "user_id": user.id } });

    let response = client.post("/api/polka/webhooks").json(&payload).dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .post("/api/polka/webhooks")
        .header(api_key("wrong-key"))
        .json(&payload)
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .post("/api/polka/webhooks")
        .header(bearer(TEST_POLKA_KEY))
        .json(&payload)
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let session = login(&client, "walt@breakingbad.com");
    assert!(!session.user.is_chirpy_red);
}
