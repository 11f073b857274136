#[rocket::launch]
fn rocket() -> _ {
    chirpy::rocket()
}
