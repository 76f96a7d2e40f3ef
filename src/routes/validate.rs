use chrono::Utc;
use rocket::data::Capped;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{json, Json, Value};
use serde::{Deserialize, Serialize};

use crate::config::ConfigSnapshot;
use crate::validator::{validate, Denial, Verdict};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResponse {
    fn rejected(message: &str) -> Self {
        ValidationResponse {
            valid: false,
            error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

/// Pull `code` out of the request body. Anything but a complete JSON object
/// with a string `code` counts as no code at all.
fn submitted_code(body: &Capped<Vec<u8>>) -> Option<String> {
    if !body.is_complete() {
        return None;
    }
    let request: Value = serde_json::from_slice(&body.value).ok()?;
    request.get("code")?.as_str().map(str::to_string)
}

#[post("/api/validate-code", data = "<body>")]
pub fn validate_code(body: Capped<Vec<u8>>, config: ConfigSnapshot) -> Custom<Json<ValidationResponse>> {
    let submitted = submitted_code(&body);

    match validate(
        submitted.as_deref(),
        config.raw_codes.as_deref(),
        &config.secret,
        Utc::now(),
    ) {
        Ok(Verdict::Granted(grant)) => {
            log::info!("access code granted for {}", grant.name);
            Custom(
                Status::Ok,
                Json(ValidationResponse {
                    valid: true,
                    name: Some(grant.name),
                    expires: Some(grant.expires),
                    token: Some(grant.token.into_string()),
                    error: None,
                }),
            )
        }
        Ok(Verdict::Denied(Denial::NoCode)) => Custom(
            Status::BadRequest,
            Json(ValidationResponse::rejected(Denial::NoCode.message())),
        ),
        Ok(Verdict::Denied(denial)) => {
            log::debug!("access code denied: {}", denial.message());
            Custom(Status::Ok, Json(ValidationResponse::rejected(denial.message())))
        }
        Err(e) => {
            log::error!("failed to load access codes: {e}");
            Custom(
                Status::InternalServerError,
                Json(ValidationResponse::rejected("Server configuration error")),
            )
        }
    }
}

#[options("/api/validate-code")]
pub fn preflight() -> Status {
    Status::Ok
}

fn method_not_allowed() -> Custom<Json<Value>> {
    Custom(
        Status::MethodNotAllowed,
        Json(json!({ "error": "Method not allowed" })),
    )
}

#[get("/api/validate-code")]
pub fn reject_get() -> Custom<Json<Value>> {
    method_not_allowed()
}

#[put("/api/validate-code")]
pub fn reject_put() -> Custom<Json<Value>> {
    method_not_allowed()
}

#[delete("/api/validate-code")]
pub fn reject_delete() -> Custom<Json<Value>> {
    method_not_allowed()
}

#[patch("/api/validate-code")]
pub fn reject_patch() -> Custom<Json<Value>> {
    method_not_allowed()
}

/// Keeps error responses under `/api` in the `{ valid, error }` shape.
#[catch(default)]
pub fn api_error(status: Status, _request: &rocket::Request<'_>) -> Custom<Json<ValidationResponse>> {
    let message = match status.code {
        400 | 413 | 422 => Denial::NoCode.message(),
        _ => status.reason().unwrap_or("Something went wrong"),
    };
    Custom(status, Json(ValidationResponse::rejected(message)))
}
