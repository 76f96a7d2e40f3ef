use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use std::env;

use crate::state::AppState;

/// Environment variable holding the JSON list of access codes.
pub const CODES_VAR: &str = "CAREER_CODES";
/// Environment variable holding the token secret.
pub const SECRET_VAR: &str = "CAREER_SALT";
/// Secret used when none is configured. Meant for local development only.
pub const DEFAULT_SECRET: &str = "career-highlights-dev";

/// Where the validator reads its code list and token secret from.
///
/// Implementations are asked again on every request.
pub trait CodeSource: Send + Sync {
    fn raw_codes(&self) -> Option<String>;
    fn secret(&self) -> Option<String>;
}

/// Reads the code list and secret from the process environment, by default
/// from `CAREER_CODES` and `CAREER_SALT`. Blank values count as unset.
#[derive(Debug, Clone, Copy)]
pub struct EnvSource {
    pub codes_var: &'static str,
    pub secret_var: &'static str,
}

impl Default for EnvSource {
    fn default() -> Self {
        EnvSource {
            codes_var: CODES_VAR,
            secret_var: SECRET_VAR,
        }
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl CodeSource for EnvSource {
    fn raw_codes(&self) -> Option<String> {
        non_blank_var(self.codes_var)
    }

    fn secret(&self) -> Option<String> {
        non_blank_var(self.secret_var)
    }
}

/// Fixed values, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    pub codes: Option<String>,
    pub secret: Option<String>,
}

impl StaticSource {
    pub fn new(codes: impl Into<String>) -> Self {
        StaticSource {
            codes: Some(codes.into()),
            secret: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

impl CodeSource for StaticSource {
    fn raw_codes(&self) -> Option<String> {
        self.codes.clone()
    }

    fn secret(&self) -> Option<String> {
        self.secret.clone()
    }
}

/// The configuration as read for a single request.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub raw_codes: Option<String>,
    pub secret: String,
}

impl ConfigSnapshot {
    pub fn read(source: &dyn CodeSource) -> Self {
        ConfigSnapshot {
            raw_codes: source.raw_codes(),
            secret: source.secret().unwrap_or_else(|| DEFAULT_SECRET.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum SnapshotError {
    MissingState,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ConfigSnapshot {
    type Error = SnapshotError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.rocket().state::<AppState>() {
            Some(state) => Outcome::Success(ConfigSnapshot::read(state.source.as_ref())),
            None => Outcome::Error((Status::InternalServerError, SnapshotError::MissingState)),
        }
    }
}
