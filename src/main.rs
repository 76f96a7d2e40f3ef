use career_gate::config::EnvSource;
use career_gate::state::AppState;

#[rocket::launch]
fn rocket() -> _ {
    career_gate::build(AppState::new(EnvSource::default()))
}
