use dotenvy::dotenv;
use rocket::{Build, Rocket, launch};

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();
    log::info!("🚀 InternHub API starting");

    internhub_server::rocket()
}
