use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    routes::utils_routes::{
        bad_gateway_response, bad_request_response, conflict_response, not_found_response,
        unauthorized_response,
    },
    structs::{flow_struct::FlowStep, response_struct::ApiResponse},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    SlotTooShort,
    LeadTimeViolation,
    Unknown,
}

/// Why the backend (or the local pre-checks) refused a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{detail}")]
pub struct BookingRejection {
    pub kind: RejectionKind,
    pub detail: String,
}

impl BookingRejection {
    pub fn new(kind: RejectionKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Text shown next to the confirm button. Unknown rejections are shown verbatim.
    pub fn user_message(&self) -> String {
        match self.kind {
            RejectionKind::SlotTooShort => {
                "This slot is already partly taken. Pick another time or get in touch.".to_string()
            }
            RejectionKind::LeadTimeViolation => {
                "Bookings must be requested at least 2 hours before they start. Please pick a later time."
                    .to_string()
            }
            RejectionKind::Unknown => self.detail.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Booking rejected: {0}")]
    Rejected(BookingRejection),

    #[error("Unexpected backend payload: {0}")]
    Decode(String),
}

impl BackendError {
    /// Transport-level failures the visitor can simply retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::Rejected(_) | BackendError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("Booking flow {0} not found")]
    NotFound(Uuid),

    #[error("Cannot {event} while {step}")]
    InvalidTransition { step: FlowStep, event: &'static str },

    #[error("That slot is not among the offered slots")]
    SlotNotOffered,

    #[error("A booking request is already being sent")]
    SubmissionInFlight,

    #[error("Client details must be entered before submitting")]
    MissingDetails,

    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(describe_validation(&errors))
    }
}

/// Flattens validator output into "field: message; field: message".
pub fn describe_validation(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: invalid value"),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Backend(BackendError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Backend(BackendError::Status { status, .. }) => match *status {
                401 => StatusCode::UNAUTHORIZED,
                403 => StatusCode::FORBIDDEN,
                404 => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Flow(FlowError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Flow(FlowError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Flow(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Backend(BackendError::Rejected(rejection)) => {
                HttpResponse::UnprocessableEntity().json(ApiResponse {
                    success: false,
                    data: Some(rejection.clone()),
                    message: Some(rejection.user_message()),
                })
            }

            AppError::Backend(BackendError::Status { status, body }) => match *status {
                401 | 403 => HttpResponse::build(self.status_code()).json(ApiResponse::<()> {
                    success: false,
                    data: None,
                    message: Some("The booking service refused these credentials.".to_string()),
                }),
                404 => not_found_response("Not found on the booking service.".to_string()),
                _ => bad_gateway_response(format!("Booking service error {status}: {body}")),
            },

            AppError::Backend(err) => bad_gateway_response(err.to_string()),

            AppError::Flow(FlowError::NotFound(_)) | AppError::NotFound(_) => {
                not_found_response(self.to_string())
            }

            AppError::Flow(FlowError::Validation(message)) | AppError::Validation(message) => {
                bad_request_response(message.clone())
            }

            AppError::Flow(err) => conflict_response(err.to_string()),

            AppError::Unauthorized(message) => unauthorized_response(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_map_kinds_to_guidance() {
        let short = BookingRejection::new(RejectionKind::SlotTooShort, "Durée supérieure");
        let lead = BookingRejection::new(RejectionKind::LeadTimeViolation, "moins de 2h");
        let other = BookingRejection::new(RejectionKind::Unknown, "Service suspendu.");

        assert!(short.user_message().contains("partly taken"));
        assert!(lead.user_message().contains("2 hours"));
        assert_eq!(other.user_message(), "Service suspendu.");
    }

    #[test]
    fn status_codes_follow_error_family() {
        let rejected = AppError::Backend(BackendError::Rejected(BookingRejection::new(
            RejectionKind::Unknown,
            "nope",
        )));
        assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = AppError::Backend(BackendError::Status {
            status: 404,
            body: String::new(),
        });
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let upstream = AppError::Backend(BackendError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);

        let conflict = AppError::Flow(FlowError::SubmissionInFlight);
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let unknown_flow = AppError::Flow(FlowError::NotFound(Uuid::nil()));
        assert_eq!(unknown_flow.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rejection_response_carries_kind() {
        let err = AppError::Backend(BackendError::Rejected(BookingRejection::new(
            RejectionKind::LeadTimeViolation,
            "Sam n'accepte pas les rendez-vous réservés à moins de 2h.",
        )));

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn retryable_only_for_transport_and_upstream_failures() {
        assert!(!BackendError::Decode("bad".into()).is_retryable());
        assert!(
            BackendError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !BackendError::Status {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !BackendError::Rejected(BookingRejection::new(RejectionKind::Unknown, "x"))
                .is_retryable()
        );
    }
}
