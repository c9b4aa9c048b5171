//! The booking modal as an explicit state machine, plus the in-memory store that
//! keeps one per visitor.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{FlowError, describe_validation},
    structs::{
        flow_struct::{ClientDetails, FlowIssue, FlowStep, ServiceChoice},
        remote_struct::{NewBooking, Service},
        util_struct::CandidateSlot,
    },
    utils::{slot_utils::find_slot, time_utils::format_local_iso},
};

#[derive(Debug, Clone, Serialize)]
pub struct BookingFlow {
    pub id: Uuid,
    pub step: FlowStep,
    pub service: Option<ServiceChoice>,
    pub date: Option<NaiveDate>,
    pub slots: Vec<CandidateSlot>,
    pub selected_slot: Option<CandidateSlot>,
    pub details: Option<ClientDetails>,
    pub loading_slots: bool,
    pub submitting: bool,
    pub last_error: Option<FlowIssue>,
    pub booking_id: Option<i64>,

    #[serde(skip)]
    fetch_seq: u64,
}

/// Issued when a date is chosen. Slots fetched for that date are only applied
/// if the ticket is still the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub date: NaiveDate,
    pub service_id: i64,
    pub duration_minutes: u32,
}

/// What [`BookingFlow::begin_submit`] hands to the caller to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub booking: NewBooking,
    pub start: DateTime<Tz>,
}

impl BookingFlow {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            step: FlowStep::SelectingService,
            service: None,
            date: None,
            slots: Vec::new(),
            selected_slot: None,
            details: None,
            loading_slots: false,
            submitting: false,
            last_error: None,
            booking_id: None,
            fetch_seq: 0,
        }
    }

    /// True when the date step has nothing to offer and the visitor should be
    /// sent to the contact form instead.
    pub fn needs_contact_fallback(&self) -> bool {
        self.step == FlowStep::SelectingSlot && self.slots.is_empty()
    }

    fn expect_step(&self, step: FlowStep, event: &'static str) -> Result<(), FlowError> {
        if self.step != step {
            return Err(FlowError::InvalidTransition {
                step: self.step,
                event,
            });
        }
        Ok(())
    }

    pub fn choose_service(&mut self, service: &Service, duration_minutes: u32) -> Result<(), FlowError> {
        self.expect_step(FlowStep::SelectingService, "choose a service")?;

        if !service.is_active {
            return Err(FlowError::Validation(format!(
                "{} cannot be booked at the moment.",
                service.title
            )));
        }

        if !service.offers(duration_minutes) {
            return Err(FlowError::Validation(format!(
                "{} is not offered for {} minutes.",
                service.title, duration_minutes
            )));
        }

        self.service = Some(ServiceChoice {
            service_id: service.id,
            title: service.title.clone(),
            duration_minutes,
            price: service.price_for(duration_minutes),
        });
        self.date = None;
        self.slots.clear();
        self.selected_slot = None;
        self.loading_slots = false;
        self.last_error = None;

        // Anything still in flight belongs to the previous choice.
        self.fetch_seq += 1;
        self.step = FlowStep::SelectingDate;
        Ok(())
    }

    pub fn begin_date_fetch(&mut self, date: NaiveDate) -> Result<FetchTicket, FlowError> {
        self.expect_step(FlowStep::SelectingDate, "choose a date")?;

        let service = self.service.as_ref().ok_or(FlowError::InvalidTransition {
            step: self.step,
            event: "choose a date",
        })?;

        self.fetch_seq += 1;
        self.date = Some(date);
        self.slots.clear();
        self.selected_slot = None;
        self.loading_slots = true;
        self.last_error = None;

        Ok(FetchTicket {
            seq: self.fetch_seq,
            date,
            service_id: service.service_id,
            duration_minutes: service.duration_minutes,
        })
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.fetch_seq
            && self.step == FlowStep::SelectingDate
            && self.date == Some(ticket.date)
    }

    /// Returns `false` when the ticket is stale and the slots were dropped.
    pub fn apply_slots(&mut self, ticket: &FetchTicket, slots: Vec<CandidateSlot>) -> bool {
        if !self.is_current(ticket) {
            debug!(flow_id = %self.id, seq = ticket.seq, latest = self.fetch_seq, "Dropping stale slots");
            return false;
        }

        self.slots = slots;
        self.loading_slots = false;
        self.step = FlowStep::SelectingSlot;
        true
    }

    /// Records a failed fetch for the current ticket. The date stays selected so
    /// the visitor can retry.
    pub fn fail_fetch(&mut self, ticket: &FetchTicket, issue: FlowIssue) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.loading_slots = false;
        self.last_error = Some(issue);
        true
    }

    pub fn choose_slot(&mut self, availability_id: i64, start: &DateTime<Tz>) -> Result<(), FlowError> {
        self.expect_step(FlowStep::SelectingSlot, "choose a slot")?;

        let slot = find_slot(&self.slots, availability_id, start)
            .cloned()
            .ok_or(FlowError::SlotNotOffered)?;

        self.selected_slot = Some(slot);
        self.last_error = None;
        self.step = FlowStep::EnteringDetails;
        Ok(())
    }

    pub fn enter_details(&mut self, details: ClientDetails) -> Result<(), FlowError> {
        self.expect_step(FlowStep::EnteringDetails, "enter details")?;

        if self.submitting {
            return Err(FlowError::SubmissionInFlight);
        }

        details
            .validate()
            .map_err(|errors| FlowError::Validation(describe_validation(&errors)))?;

        self.details = Some(details);
        self.last_error = None;
        Ok(())
    }

    /// Marks the flow as submitting and builds the request. A second call before
    /// [`BookingFlow::finish_submit`] is refused.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, FlowError> {
        self.expect_step(FlowStep::EnteringDetails, "submit")?;

        if self.submitting {
            return Err(FlowError::SubmissionInFlight);
        }

        let details = self.details.as_ref().ok_or(FlowError::MissingDetails)?;
        let (service, slot) = match (&self.service, &self.selected_slot) {
            (Some(service), Some(slot)) => (service, slot),
            _ => {
                return Err(FlowError::InvalidTransition {
                    step: self.step,
                    event: "submit",
                });
            }
        };

        let booking = NewBooking {
            client_name: details.client_name.clone(),
            client_email: details.client_email.clone(),
            client_phone: details.client_phone.clone(),
            service_id: service.service_id,
            availability_id: slot.availability_id,
            duration_minutes: service.duration_minutes,
            start_datetime: format_local_iso(&slot.start),
        };

        let start = slot.start;

        self.submitting = true;
        self.last_error = None;
        Ok(PendingSubmission { booking, start })
    }

    pub fn finish_submit(&mut self, outcome: Result<i64, FlowIssue>) {
        self.submitting = false;

        match outcome {
            Ok(booking_id) => {
                self.booking_id = Some(booking_id);
                self.last_error = None;
                self.step = FlowStep::Submitted;
            }
            Err(issue) => self.last_error = Some(issue),
        }
    }

    pub fn back(&mut self) -> Result<(), FlowError> {
        if self.submitting {
            return Err(FlowError::SubmissionInFlight);
        }

        let previous = self.step.previous().ok_or(FlowError::InvalidTransition {
            step: self.step,
            event: "go back",
        })?;

        self.loading_slots = false;
        self.last_error = None;
        self.step = previous;
        Ok(())
    }
}

struct StoredFlow {
    flow: BookingFlow,
    touched_at: Instant,
}

/// Live booking flows keyed by id. Flows idle for longer than the TTL are
/// dropped on the next access. The lock is never held across an await.
pub struct FlowStore {
    flows: Mutex<HashMap<Uuid, StoredFlow>>,
    ttl: Duration,
}

impl FlowStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            flows: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn evict_expired(flows: &mut HashMap<Uuid, StoredFlow>, ttl: Duration) {
        let before = flows.len();
        flows.retain(|_, stored| stored.touched_at.elapsed() < ttl);

        let evicted = before - flows.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle booking flows");
        }
    }

    pub fn create(&self) -> BookingFlow {
        let mut flows = self.flows.lock();
        Self::evict_expired(&mut flows, self.ttl);

        let flow = BookingFlow::new(Uuid::new_v4());
        flows.insert(
            flow.id,
            StoredFlow {
                flow: flow.clone(),
                touched_at: Instant::now(),
            },
        );
        flow
    }

    /// Runs `f` on the flow under the lock and refreshes its idle timer.
    pub fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut BookingFlow) -> Result<R, FlowError>,
    ) -> Result<R, FlowError> {
        let mut flows = self.flows.lock();
        Self::evict_expired(&mut flows, self.ttl);

        let stored = flows.get_mut(&id).ok_or(FlowError::NotFound(id))?;
        stored.touched_at = Instant::now();
        f(&mut stored.flow)
    }

    pub fn snapshot(&self, id: Uuid) -> Result<BookingFlow, FlowError> {
        self.update(id, |flow| Ok(flow.clone()))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.flows.lock().remove(&id).is_some()
    }

    /// Starts a submission. The returned guard must be finished with the outcome;
    /// if it is dropped first, the flow is released with a retryable error.
    pub fn begin_submit(&self, id: Uuid) -> Result<(PendingSubmission, SubmitGuard<'_>), FlowError> {
        let submission = self.update(id, |flow| flow.begin_submit())?;
        let guard = SubmitGuard {
            store: self,
            id,
            armed: true,
        };
        Ok((submission, guard))
    }
}

/// Holds a flow's in-flight flag for one submission.
pub struct SubmitGuard<'a> {
    store: &'a FlowStore,
    id: Uuid,
    armed: bool,
}

impl SubmitGuard<'_> {
    pub fn finish(mut self, outcome: Result<i64, FlowIssue>) -> Result<(), FlowError> {
        self.armed = false;
        self.store.update(self.id, |flow| {
            flow.finish_submit(outcome);
            Ok(())
        })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!(flow_id = %self.id, "Submission dropped before the backend answered");
        // The flow may have been closed in the meantime.
        let _ = self.store.update(self.id, |flow| {
            flow.finish_submit(Err(FlowIssue::interrupted()));
            Ok(())
        });
    }
}
