use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{BackendError, BookingRejection, RejectionKind};

/// Where a visitor is in the booking modal. Moves forward or back one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    SelectingService,
    SelectingDate,
    SelectingSlot,
    EnteringDetails,
    Submitted,
}

impl FlowStep {
    pub fn previous(self) -> Option<FlowStep> {
        match self {
            FlowStep::SelectingService | FlowStep::Submitted => None,
            FlowStep::SelectingDate => Some(FlowStep::SelectingService),
            FlowStep::SelectingSlot => Some(FlowStep::SelectingDate),
            FlowStep::EnteringDetails => Some(FlowStep::SelectingSlot),
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowStep::SelectingService => "selecting a service",
            FlowStep::SelectingDate => "selecting a date",
            FlowStep::SelectingSlot => "selecting a slot",
            FlowStep::EnteringDetails => "entering details",
            FlowStep::Submitted => "submitted",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    ChooseService {
        service_id: i64,
        duration_minutes: u32,
    },
    ChooseDate {
        date: NaiveDate,
    },
    ChooseSlot {
        availability_id: i64,
        start: String,
    },
    EnterDetails {
        client_name: String,
        client_email: String,
        #[serde(default)]
        client_phone: Option<String>,
    },
    Submit,
    Back,
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::ChooseService { .. } => "choose a service",
            FlowEvent::ChooseDate { .. } => "choose a date",
            FlowEvent::ChooseSlot { .. } => "choose a slot",
            FlowEvent::EnterDetails { .. } => "enter details",
            FlowEvent::Submit => "submit",
            FlowEvent::Back => "go back",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClientDetails {
    #[validate(length(min = 1, max = 120, message = "Name is required."))]
    pub client_name: String,
    #[validate(email(message = "A valid email is required."))]
    pub client_email: String,
    #[validate(length(max = 32, message = "Phone number is too long."))]
    pub client_phone: Option<String>,
}

impl ClientDetails {
    /// Trims every field and turns a blank phone into `None`.
    pub fn normalized(client_name: &str, client_email: &str, client_phone: Option<&str>) -> Self {
        Self {
            client_name: client_name.trim().to_string(),
            client_email: client_email.trim().to_string(),
            client_phone: client_phone
                .map(str::trim)
                .filter(|phone| !phone.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChoice {
    pub service_id: i64,
    pub title: String,
    pub duration_minutes: u32,
    pub price: Option<Decimal>,
}

/// Last failure shown inline in the flow. Selections are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RejectionKind>,
    pub message: String,
    pub retryable: bool,
}

impl FlowIssue {
    pub fn from_rejection(rejection: &BookingRejection) -> Self {
        Self {
            kind: Some(rejection.kind),
            message: rejection.user_message(),
            retryable: false,
        }
    }

    /// The request carrying a submission went away before the backend answered.
    /// The booking may or may not have been recorded.
    pub fn interrupted() -> Self {
        Self {
            kind: None,
            message: "The booking request was interrupted. Check your email for a confirmation before trying again.".to_string(),
            retryable: true,
        }
    }

    pub fn from_backend(err: &BackendError) -> Self {
        match err {
            BackendError::Rejected(rejection) => Self::from_rejection(rejection),
            err if err.is_retryable() => Self {
                kind: None,
                message: "The booking service could not be reached. Please try again.".to_string(),
                retryable: true,
            },
            err => Self {
                kind: None,
                message: err.to_string(),
                retryable: false,
            },
        }
    }
}
