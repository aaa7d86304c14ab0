use std::fmt;

#[cfg(feature = "actix-web")]
use actix_web::{http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};

/// An error that knows how it should be reported to a remote caller.
pub trait ReportError: fmt::Display {
    /// A stable, machine-readable name of the failure class.
    fn kind(&self) -> &'static str;

    /// The HTTP status code that best describes the failure.
    fn status(&self) -> u16;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "result", content = "spec")]
pub enum Result<T> {
    Ok(T),
    Err(ErrorSpec),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSpec {
    pub kind: String,
    pub message: String,
    #[serde(skip, default = "ErrorSpec::default_status")]
    pub status: u16,
}

impl ErrorSpec {
    const fn default_status() -> u16 {
        500
    }

    pub fn new(kind: impl ToString, message: impl ToString, status: u16) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
            status,
        }
    }
}

impl<E> From<&E> for ErrorSpec
where
    E: ReportError,
{
    fn from(error: &E) -> Self {
        Self::new(error.kind(), error, error.status())
    }
}

impl<T, E> From<::core::result::Result<T, E>> for Result<T>
where
    E: ReportError,
{
    fn from(value: ::core::result::Result<T, E>) -> Self {
        match value {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Err((&error).into()),
        }
    }
}

#[cfg(feature = "actix-web")]
impl<T> From<Result<T>> for HttpResponse
where
    T: Serialize,
{
    fn from(value: Result<T>) -> Self {
        match &value {
            Result::Ok(_) => HttpResponse::Ok().json(value),
            Result::Err(spec) => {
                let status =
                    StatusCode::from_u16(spec.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                HttpResponse::build(status).json(value)
            }
        }
    }
}
