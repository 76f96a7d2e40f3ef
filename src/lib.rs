#[macro_use]
extern crate rocket;

pub mod config;
pub mod cors;
pub mod db;
pub mod expiry;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;
pub mod validator;

use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};

use crate::config::{CodeSource, SECRET_VAR};
use crate::cors::Cors;
use crate::state::AppState;

/// The warning logged at liftoff when tokens would use the development secret.
pub fn secret_warning(source: &dyn CodeSource) -> Option<String> {
    match source.secret() {
        Some(_) => None,
        None => Some(format!("{SECRET_VAR} is not set, tokens use the development secret")),
    }
}

pub fn build(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/", routes::routes())
        .register("/api", routes::api_catchers())
        .attach(Cors)
        .attach(AdHoc::on_liftoff("Token secret check", |rocket| {
            Box::pin(async move {
                if let Some(state) = rocket.state::<AppState>() {
                    if let Some(warning) = secret_warning(state.source.as_ref()) {
                        log::warn!("{warning}");
                    }
                }
            })
        }))
}
