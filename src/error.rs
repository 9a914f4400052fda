use std::io;

use thiserror::Error;

/// Every way a login attempt can fail. A corrupt cache is not in here: it is
/// handled inside the cache and never reaches the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Request failed, check network connection: {0}")]
    Network(String),

    #[error("Unexpected response from the identity provider: {0}")]
    Protocol(String),

    #[error("Authentication failed: {0}")]
    Authorization(String),

    #[error("Authentication succeeded, but the identity provider granted no AWS role")]
    NoEntitlements,

    #[error("Invalid input: {0}")]
    UserInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl AuthError {
    /// Process exit status for this failure.
    ///
    /// - 1: configuration or local I/O
    /// - 2: authentication failed (rejected credentials, bad protocol data, no roles)
    /// - 3: network
    /// - 4: invalid user input
    pub fn exit_code(&self) -> i32 {
        match self {
            AuthError::Config(_) | AuthError::Io(_) => 1,
            AuthError::Protocol(_) | AuthError::Authorization(_) | AuthError::NoEntitlements => 2,
            AuthError::Network(_) => 3,
            AuthError::UserInput(_) => 4,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AuthError::Protocol(e.to_string())
        } else {
            AuthError::Network(e.to_string())
        }
    }
}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Protocol(e.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
