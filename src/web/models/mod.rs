use serde::{Deserialize, Serialize};

pub mod todo_models;

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Caller identity, inserted as a request extension by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject: String,
}
