//! In-memory backend used by the route tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono_tz::Europe::Paris;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::{
    error::{BackendError, BookingRejection},
    structs::remote_struct::{
        Availability, AvailabilityFilter, Booking, BookingStatus, ContactForm, ContactMessage,
        CreateAvailability, CreateService, MessageAck, NewBooking, Service, UpdateAvailability,
        UpdateService,
    },
    utils::{
        backend_utils::BookingBackend,
        time_utils::{RawTimestamp, local_day},
    },
};

pub const ADMIN_TOKEN: &str = "admin-secret";

#[derive(Default)]
pub struct FakeBackend {
    pub services: Vec<Service>,
    pub availabilities: Vec<Availability>,
    pub bookings: Vec<Booking>,
    pub messages: Vec<ContactMessage>,
    pub unreachable: bool,
    pub availabilities_down: bool,
    pub stall_bookings: bool,
    pub reject_with: Option<BookingRejection>,
    pub sent_bookings: Mutex<Vec<NewBooking>>,
    pub sent_contacts: Mutex<Vec<ContactForm>>,
}

pub fn service(id: i64, title: &str, durations: &[u32], active: bool) -> Service {
    let durations_prices: BTreeMap<String, Decimal> = durations
        .iter()
        .map(|minutes| (minutes.to_string(), Decimal::from(*minutes)))
        .collect();

    Service {
        id,
        title: title.to_string(),
        description: String::new(),
        durations_prices,
        image: None,
        is_active: active,
    }
}

pub fn availability(id: i64, start: &str, end: &str, is_booked: bool) -> Availability {
    Availability {
        id,
        start_datetime: RawTimestamp::parse(start).unwrap(),
        end_datetime: RawTimestamp::parse(end).unwrap(),
        is_booked,
        created_at: None,
        updated_at: None,
    }
}

pub fn message(id: i64, is_read: bool) -> ContactMessage {
    ContactMessage {
        id,
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        phone: None,
        message: "Bonjour".to_string(),
        is_read,
        created_at: None,
    }
}

impl FakeBackend {
    fn reachable(&self) -> Result<(), BackendError> {
        if self.unreachable {
            return Err(BackendError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn admin(&self, token: &str) -> Result<(), BackendError> {
        self.reachable()?;
        if token != ADMIN_TOKEN {
            return Err(BackendError::Status {
                status: 401,
                body: r#"{"detail": "Invalid token."}"#.to_string(),
            });
        }
        Ok(())
    }

    fn not_found() -> BackendError {
        BackendError::Status {
            status: 404,
            body: r#"{"detail": "Not found."}"#.to_string(),
        }
    }

    fn ack(message: &str) -> MessageAck {
        MessageAck {
            message: message.to_string(),
        }
    }

    pub fn booking(&self, id: i64, status: BookingStatus) -> Booking {
        Booking {
            id,
            service: self.services[0].clone(),
            availability: self.availabilities[0].clone(),
            client_name: "Ana".to_string(),
            client_email: "ana@example.com".to_string(),
            client_phone: None,
            client_comment: None,
            duration_minutes: Some(60),
            status,
            created_at: None,
            updated_at: None,
        }
    }
}

#[async_trait]
impl BookingBackend for FakeBackend {
    async fn list_services(&self) -> Result<Vec<Service>, BackendError> {
        self.reachable()?;
        Ok(self.services.clone())
    }

    async fn list_availabilities(
        &self,
        _token: Option<&str>,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<Availability>, BackendError> {
        self.reachable()?;
        if self.availabilities_down {
            return Err(BackendError::Status {
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }

        Ok(self
            .availabilities
            .iter()
            .filter(|availability| match filter.date {
                Some(date) => availability
                    .start_datetime
                    .in_zone(&Paris)
                    .is_some_and(|start| local_day(&start) == date),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError> {
        self.reachable()?;

        if self.stall_bookings {
            std::future::pending::<()>().await;
        }

        if let Some(rejection) = &self.reject_with {
            return Err(BackendError::Rejected(rejection.clone()));
        }

        let service = self
            .services
            .iter()
            .find(|service| service.id == booking.service_id)
            .cloned()
            .ok_or_else(Self::not_found)?;
        let availability = self
            .availabilities
            .iter()
            .find(|availability| availability.id == booking.availability_id)
            .cloned()
            .ok_or_else(Self::not_found)?;

        let mut sent = self.sent_bookings.lock();
        sent.push(booking.clone());

        Ok(Booking {
            id: 100 + sent.len() as i64,
            service,
            availability,
            client_name: booking.client_name.clone(),
            client_email: booking.client_email.clone(),
            client_phone: booking.client_phone.clone(),
            client_comment: None,
            duration_minutes: Some(booking.duration_minutes),
            status: BookingStatus::Pending,
            created_at: None,
            updated_at: None,
        })
    }

    async fn submit_contact(&self, form: &ContactForm) -> Result<MessageAck, BackendError> {
        self.reachable()?;
        self.sent_contacts.lock().push(form.clone());
        Ok(Self::ack("Message envoyé avec succès."))
    }

    async fn create_service(&self, token: &str, service: &CreateService) -> Result<Service, BackendError> {
        self.admin(token)?;

        Ok(Service {
            id: 50,
            title: service.title.clone(),
            description: service.description.clone(),
            durations_prices: service.durations_prices.clone(),
            image: None,
            is_active: service.is_active.unwrap_or(true),
        })
    }

    async fn update_service(
        &self,
        token: &str,
        id: i64,
        changes: &UpdateService,
    ) -> Result<Service, BackendError> {
        self.admin(token)?;

        let mut service = self
            .services
            .iter()
            .find(|service| service.id == id)
            .cloned()
            .ok_or_else(Self::not_found)?;
        if let Some(title) = &changes.title {
            service.title = title.clone();
        }
        if let Some(is_active) = changes.is_active {
            service.is_active = is_active;
        }
        Ok(service)
    }

    async fn delete_service(&self, token: &str, id: i64) -> Result<(), BackendError> {
        self.admin(token)?;
        if !self.services.iter().any(|service| service.id == id) {
            return Err(Self::not_found());
        }
        Ok(())
    }

    async fn create_availability(
        &self,
        token: &str,
        _availability: &CreateAvailability,
    ) -> Result<MessageAck, BackendError> {
        self.admin(token)?;
        Ok(Self::ack("Disponibilité ajoutée."))
    }

    async fn update_availability(
        &self,
        token: &str,
        _id: i64,
        _changes: &UpdateAvailability,
    ) -> Result<MessageAck, BackendError> {
        self.admin(token)?;
        Ok(Self::ack("Disponibilité mise à jour."))
    }

    async fn delete_availability(&self, token: &str, _id: i64) -> Result<MessageAck, BackendError> {
        self.admin(token)?;
        Ok(Self::ack("Disponibilité supprimée."))
    }

    async fn list_bookings(&self, token: &str) -> Result<Vec<Booking>, BackendError> {
        self.admin(token)?;
        Ok(self.bookings.clone())
    }

    async fn get_booking(&self, token: &str, id: i64) -> Result<Booking, BackendError> {
        self.admin(token)?;
        self.bookings
            .iter()
            .find(|booking| booking.id == id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn confirm_booking(&self, token: &str, _id: i64) -> Result<MessageAck, BackendError> {
        self.admin(token)?;
        Ok(Self::ack("Réservation confirmée."))
    }

    async fn cancel_booking(&self, token: &str, _id: i64) -> Result<MessageAck, BackendError> {
        self.admin(token)?;
        Ok(Self::ack("Réservation annulée et créneau libéré."))
    }

    async fn list_messages(&self, token: &str) -> Result<Vec<ContactMessage>, BackendError> {
        self.admin(token)?;
        Ok(self.messages.clone())
    }

    async fn mark_message_read(&self, token: &str, _id: i64) -> Result<(), BackendError> {
        self.admin(token)
    }

    async fn delete_message(&self, token: &str, _id: i64) -> Result<(), BackendError> {
        self.admin(token)
    }
}
