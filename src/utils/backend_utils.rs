//! Client for the practice's REST backend. This is the only place that reads the
//! backend's free-text error messages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::{
    error::{BackendError, BookingRejection, RejectionKind},
    structs::remote_struct::{
        Availability, AvailabilityFilter, Booking, ContactForm, ContactMessage, CreateAvailability,
        CreateService, MessageAck, NewBooking, Service, UpdateAvailability, UpdateService,
    },
};

#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>, BackendError>;

    async fn list_availabilities(
        &self,
        token: Option<&str>,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<Availability>, BackendError>;

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError>;

    async fn submit_contact(&self, form: &ContactForm) -> Result<MessageAck, BackendError>;

    async fn create_service(&self, token: &str, service: &CreateService) -> Result<Service, BackendError>;

    async fn update_service(
        &self,
        token: &str,
        id: i64,
        changes: &UpdateService,
    ) -> Result<Service, BackendError>;

    async fn delete_service(&self, token: &str, id: i64) -> Result<(), BackendError>;

    async fn create_availability(
        &self,
        token: &str,
        availability: &CreateAvailability,
    ) -> Result<MessageAck, BackendError>;

    async fn update_availability(
        &self,
        token: &str,
        id: i64,
        changes: &UpdateAvailability,
    ) -> Result<MessageAck, BackendError>;

    async fn delete_availability(&self, token: &str, id: i64) -> Result<MessageAck, BackendError>;

    async fn list_bookings(&self, token: &str) -> Result<Vec<Booking>, BackendError>;

    async fn get_booking(&self, token: &str, id: i64) -> Result<Booking, BackendError>;

    async fn confirm_booking(&self, token: &str, id: i64) -> Result<MessageAck, BackendError>;

    async fn cancel_booking(&self, token: &str, id: i64) -> Result<MessageAck, BackendError>;

    async fn list_messages(&self, token: &str) -> Result<Vec<ContactMessage>, BackendError>;

    async fn mark_message_read(&self, token: &str, id: i64) -> Result<(), BackendError>;

    async fn delete_message(&self, token: &str, id: i64) -> Result<(), BackendError>;
}

/// Pulls the human message out of an error body such as `{"error": "..."}` or
/// `{"detail": "..."}`. Field-level validation maps yield `None`.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    ["error", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

pub fn classify_rejection(message: &str) -> BookingRejection {
    let lowered = message.to_lowercase();

    let kind = if ["trop court", "durée supérieure", "créneau incompatible"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        RejectionKind::SlotTooShort
    } else if lowered.contains("moins de 2h") || lowered.contains("2h") {
        RejectionKind::LeadTimeViolation
    } else {
        RejectionKind::Unknown
    };

    BookingRejection::new(kind, message)
}

async fn error_from_response(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    BackendError::Status { status, body }
}

/// A 400 carrying a message is a domain rejection, anything else stays a status error.
fn into_rejection(err: BackendError) -> BackendError {
    match err {
        BackendError::Status { status: 400, body } => match extract_message(&body) {
            Some(message) => BackendError::Rejected(classify_rejection(&message)),
            None => BackendError::Status { status: 400, body },
        },
        other => other,
    }
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));

        match token {
            Some(token) => builder.header(AUTHORIZATION, format!("Token {token}")),
            None => builder,
        }
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "Backend request failed");
            BackendError::Transport(err)
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let err = error_from_response(response).await;
        warn!(error = %err, "Backend answered with an error");
        Err(err)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = self.send_raw(request).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn list_services(&self) -> Result<Vec<Service>, BackendError> {
        self.send(self.request(Method::GET, "services/", None)).await
    }

    #[instrument(skip(self, token))]
    async fn list_availabilities(
        &self,
        token: Option<&str>,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<Availability>, BackendError> {
        let request = self.request(Method::GET, "availabilities/", token).query(filter);
        self.send(request).await
    }

    #[instrument(skip(self, booking), fields(service_id = booking.service_id, availability_id = booking.availability_id))]
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError> {
        let request = self.request(Method::POST, "bookings/", None).json(booking);
        self.send(request).await.map_err(into_rejection)
    }

    #[instrument(skip(self, form))]
    async fn submit_contact(&self, form: &ContactForm) -> Result<MessageAck, BackendError> {
        let request = self.request(Method::POST, "contact/", None).json(form);
        self.send(request).await
    }

    #[instrument(skip(self, token, service))]
    async fn create_service(&self, token: &str, service: &CreateService) -> Result<Service, BackendError> {
        let request = self.request(Method::POST, "services/", Some(token)).json(service);
        self.send(request).await
    }

    #[instrument(skip(self, token, changes))]
    async fn update_service(
        &self,
        token: &str,
        id: i64,
        changes: &UpdateService,
    ) -> Result<Service, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("services/{id}/"), Some(token))
            .json(changes);
        self.send(request).await
    }

    #[instrument(skip(self, token))]
    async fn delete_service(&self, token: &str, id: i64) -> Result<(), BackendError> {
        self.send_raw(self.request(Method::DELETE, &format!("services/{id}/"), Some(token)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token, availability))]
    async fn create_availability(
        &self,
        token: &str,
        availability: &CreateAvailability,
    ) -> Result<MessageAck, BackendError> {
        let request = self
            .request(Method::POST, "availabilities/", Some(token))
            .json(availability);
        self.send(request).await
    }

    #[instrument(skip(self, token, changes))]
    async fn update_availability(
        &self,
        token: &str,
        id: i64,
        changes: &UpdateAvailability,
    ) -> Result<MessageAck, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("availabilities/{id}/"), Some(token))
            .json(changes);
        self.send(request).await
    }

    #[instrument(skip(self, token))]
    async fn delete_availability(&self, token: &str, id: i64) -> Result<MessageAck, BackendError> {
        self.send(self.request(Method::DELETE, &format!("availabilities/{id}/"), Some(token)))
            .await
    }

    #[instrument(skip(self, token))]
    async fn list_bookings(&self, token: &str) -> Result<Vec<Booking>, BackendError> {
        self.send(self.request(Method::GET, "bookings/", Some(token))).await
    }

    #[instrument(skip(self, token))]
    async fn get_booking(&self, token: &str, id: i64) -> Result<Booking, BackendError> {
        self.send(self.request(Method::GET, &format!("bookings/{id}/"), Some(token)))
            .await
    }

    #[instrument(skip(self, token))]
    async fn confirm_booking(&self, token: &str, id: i64) -> Result<MessageAck, BackendError> {
        self.send(self.request(Method::POST, &format!("bookings/{id}/confirm/"), Some(token)))
            .await
    }

    #[instrument(skip(self, token))]
    async fn cancel_booking(&self, token: &str, id: i64) -> Result<MessageAck, BackendError> {
        self.send(self.request(Method::POST, &format!("bookings/{id}/cancel/"), Some(token)))
            .await
    }

    #[instrument(skip(self, token))]
    async fn list_messages(&self, token: &str) -> Result<Vec<ContactMessage>, BackendError> {
        self.send(self.request(Method::GET, "contact/", Some(token))).await
    }

    #[instrument(skip(self, token))]
    async fn mark_message_read(&self, token: &str, id: i64) -> Result<(), BackendError> {
        let request = self
            .request(Method::PATCH, &format!("contact/{id}/"), Some(token))
            .json(&serde_json::json!({ "is_read": true }));
        self.send_raw(request).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn delete_message(&self, token: &str, id: i64) -> Result<(), BackendError> {
        self.send_raw(self.request(Method::DELETE, &format!("contact/{id}/"), Some(token)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_messages_are_classified() {
        let short = classify_rejection("Durée supérieure au créneau disponible.");
        assert_eq!(short.kind, RejectionKind::SlotTooShort);

        let incompatible = classify_rejection("Créneau incompatible avec ces horaires.");
        assert_eq!(incompatible.kind, RejectionKind::SlotTooShort);

        let lead = classify_rejection("Sam n'accepte pas les rendez-vous réservés à moins de 2h.");
        assert_eq!(lead.kind, RejectionKind::LeadTimeViolation);
    }

    #[test]
    fn unknown_messages_are_kept_verbatim() {
        let rejection = classify_rejection("Créneau indisponible.");

        assert_eq!(rejection.kind, RejectionKind::Unknown);
        assert_eq!(rejection.detail, "Créneau indisponible.");
        assert_eq!(rejection.user_message(), "Créneau indisponible.");
    }

    #[test]
    fn error_bodies_yield_their_message() {
        assert_eq!(
            extract_message(r#"{"error": "Champs manquants."}"#).as_deref(),
            Some("Champs manquants.")
        );
        assert_eq!(
            extract_message(r#"{"detail": "Not found."}"#).as_deref(),
            Some("Not found.")
        );
        assert_eq!(extract_message(r#"{"start_datetime": ["required"]}"#), None);
        assert_eq!(extract_message("<html>oops</html>"), None);
    }

    #[test]
    fn only_bad_requests_with_a_message_become_rejections() {
        let rejected = into_rejection(BackendError::Status {
            status: 400,
            body: r#"{"error": "Durée supérieure au créneau disponible."}"#.to_string(),
        });
        assert!(matches!(
            rejected,
            BackendError::Rejected(BookingRejection {
                kind: RejectionKind::SlotTooShort,
                ..
            })
        ));

        let upstream = into_rejection(BackendError::Status {
            status: 500,
            body: r#"{"error": "Erreur serveur."}"#.to_string(),
        });
        assert!(matches!(upstream, BackendError::Status { status: 500, .. }));

        let field_errors = into_rejection(BackendError::Status {
            status: 400,
            body: r#"{"client_email": ["Enter a valid email address."]}"#.to_string(),
        });
        assert!(matches!(field_errors, BackendError::Status { status: 400, .. }));
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let backend = HttpBackend::new("https://api.example.com/api/", Duration::from_secs(1)).unwrap();

        assert_eq!(backend.url("services/"), "https://api.example.com/api/services/");
        assert_eq!(backend.url("/contact/4/"), "https://api.example.com/api/contact/4/");
    }
}
