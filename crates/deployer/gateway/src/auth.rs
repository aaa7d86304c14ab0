use std::collections::BTreeSet;

use actix_web::{http::header, HttpRequest, HttpResponse};
use deployer_core::result::{ReportError, Result};
use thiserror::Error;
use tracing::{instrument, Level};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token is required. Use Authorization: Bearer <token>")]
    TokenNotFound,
    #[error("API_TOKENS not configured in environment")]
    NotConfigured,
    #[error("Invalid or expired token")]
    InvalidToken,
}

impl ReportError for AuthError {
    fn kind(&self) -> &'static str {
        match self {
            Self::TokenNotFound | Self::InvalidToken => "AuthError",
            Self::NotConfigured => "ConfigurationError",
        }
    }

    fn status(&self) -> u16 {
        match self {
            Self::TokenNotFound => 401,
            Self::NotConfigured => 500,
            Self::InvalidToken => 403,
        }
    }
}

impl AuthError {
    pub fn into_response(self) -> HttpResponse {
        HttpResponse::from(Result::<()>::from(::core::result::Result::<(), _>::Err(self)))
    }
}

/// The static set of bearer tokens accepted by protected routes.
#[derive(Default)]
pub struct ApiTokens(BTreeSet<String>);

impl ApiTokens {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self(
            tokens
                .into_iter()
                .map(|token| token.as_ref().trim().to_string())
                .filter(|token| !token.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[instrument(level = Level::INFO, skip_all, err(Display))]
    pub fn authorize(&self, request: &HttpRequest) -> ::core::result::Result<(), AuthError> {
        let token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::TokenNotFound)?;

        if self.0.is_empty() {
            Err(AuthError::NotConfigured)
        } else if self.0.contains(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}
