//! Error handlers for the path, JSON and query extractors. Every rejection is a
//! 400 in the usual envelope, naming the part of the request that was wrong.

use std::fmt::Display;

use actix_web::{HttpRequest, ResponseError, error};
use tracing::debug;

use crate::routes::utils_routes::bad_request_response;

fn reject<E>(err: E, req: &HttpRequest, part: &str, detail: impl Display) -> error::Error
where
    E: ResponseError + 'static,
{
    debug!(path = %req.path(), part, error = %detail, "Rejected request");

    let response = bad_request_response(format!("Invalid {part}: {detail}"));
    error::InternalError::from_response(err, response).into()
}

pub fn path_error_handler(err: error::PathError, req: &HttpRequest) -> error::Error {
    let detail = err.to_string();
    reject(err, req, "URL segment", detail)
}

pub fn json_error_handler(err: error::JsonPayloadError, req: &HttpRequest) -> error::Error {
    let detail = match &err {
        error::JsonPayloadError::Deserialize(json_err) => json_err.to_string(),
        error::JsonPayloadError::ContentType => "expected an application/json body".to_string(),
        other => other.to_string(),
    };
    reject(err, req, "request body", detail)
}

pub fn query_error_handler(err: error::QueryPayloadError, req: &HttpRequest) -> error::Error {
    let detail = match &err {
        error::QueryPayloadError::Deserialize(query_err) => query_err.to_string(),
        other => other.to_string(),
    };
    reject(err, req, "query string", detail)
}
