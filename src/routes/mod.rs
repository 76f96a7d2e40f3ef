use rocket::{Catcher, Route};

pub mod validate;

pub fn routes() -> Vec<Route> {
    routes![
        validate::validate_code,
        validate::preflight,
        // everything but POST and OPTIONS
        validate::reject_get,
        validate::reject_put,
        validate::reject_delete,
        validate::reject_patch,
    ]
}

pub fn api_catchers() -> Vec<Catcher> {
    catchers![validate::api_error]
}
