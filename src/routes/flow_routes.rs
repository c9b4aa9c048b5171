use actix_web::{HttpResponse, web};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, FlowError},
    structs::{
        flow_struct::{ClientDetails, FlowEvent, FlowIssue},
        remote_struct::AvailabilityFilter,
        response_struct::ApiResponse,
    },
    utils::{
        backend_utils::BookingBackend,
        booking_utils::find_service,
        flow_utils::FlowStore,
        slot_utils::{check_lead_time, plan_slots, windows_from},
        time_utils::RawTimestamp,
    },
};

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn create_flow(store: web::Data<FlowStore>) -> HttpResponse {
    let flow = store.create();
    info!(flow_id = %flow.id, "Booking flow started");

    HttpResponse::Created().json(ApiResponse::ok(flow, "Booking flow started"))
}

async fn get_flow(path: web::Path<Uuid>, store: web::Data<FlowStore>) -> Result<HttpResponse, AppError> {
    let flow = store.snapshot(path.into_inner())?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(flow, "Booking flow retrieved")))
}

async fn delete_flow(path: web::Path<Uuid>, store: web::Data<FlowStore>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !store.remove(id) {
        return Err(FlowError::NotFound(id).into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        data: None,
        message: Some("Booking flow closed".to_string()),
    }))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn handle_event(
    path: web::Path<Uuid>,
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
    store: web::Data<FlowStore>,
    body: web::Json<FlowEvent>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let event = body.into_inner();
    let event_name = event.name();

    match event {
        FlowEvent::ChooseService {
            service_id,
            duration_minutes,
        } => {
            // Fail fast on unknown flows before asking the backend.
            store.snapshot(id)?;
            let service = find_service(backend.list_services().await?, service_id)?;
            store.update(id, |flow| flow.choose_service(&service, duration_minutes))?;
        }

        FlowEvent::ChooseDate { date } => {
            let ticket = store.update(id, |flow| flow.begin_date_fetch(date))?;
            let filter = AvailabilityFilter {
                service: Some(ticket.service_id),
                date: Some(ticket.date),
            };

            match backend.list_availabilities(None, &filter).await {
                Ok(availabilities) => {
                    let windows = windows_from(&availabilities, &config.timezone);
                    let slots = plan_slots(&windows, ticket.date, ticket.duration_minutes, &config.now());
                    store.update(id, |flow| Ok(flow.apply_slots(&ticket, slots)))?;
                }
                Err(err) => {
                    warn!(flow_id = %id, error = %err, "Could not load slots for flow");
                    let issue = FlowIssue::from_backend(&err);
                    store.update(id, |flow| Ok(flow.fail_fetch(&ticket, issue)))?;
                }
            }
        }

        FlowEvent::ChooseSlot {
            availability_id,
            start,
        } => {
            let start = RawTimestamp::parse(&start)
                .and_then(|raw| raw.in_zone(&config.timezone))
                .ok_or_else(|| {
                    FlowError::Validation(format!("start: {start} is not a valid local time."))
                })?;
            store.update(id, |flow| flow.choose_slot(availability_id, &start))?;
        }

        FlowEvent::EnterDetails {
            client_name,
            client_email,
            client_phone,
        } => {
            let details = ClientDetails::normalized(&client_name, &client_email, client_phone.as_deref());
            store.update(id, |flow| flow.enter_details(details))?;
        }

        FlowEvent::Submit => {
            let (submission, guard) = store.begin_submit(id)?;

            let outcome = match check_lead_time(&submission.start, &config.now()) {
                Err(rejection) => Err(FlowIssue::from_rejection(&rejection)),
                Ok(()) => match backend.create_booking(&submission.booking).await {
                    Ok(booking) => {
                        info!(flow_id = %id, booking_id = booking.id, "Booking requested from flow");
                        Ok(booking.id)
                    }
                    Err(err) => {
                        warn!(flow_id = %id, error = %err, "Booking from flow was not accepted");
                        Err(FlowIssue::from_backend(&err))
                    }
                },
            };

            guard.finish(outcome)?;
        }

        FlowEvent::Back => store.update(id, |flow| flow.back())?,
    }

    let flow = store.snapshot(id)?;
    let message = if flow.needs_contact_fallback() {
        "No slot left on that day. Pick another date or use the contact form.".to_string()
    } else {
        format!("Applied: {event_name}")
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(flow, &message)))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

pub fn flow_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/flows")
            .route("", web::post().to(create_flow))
            .route("/{id}", web::get().to(get_flow))
            .route("/{id}", web::delete().to(delete_flow))
            .route("/{id}/events", web::post().to(handle_event)),
    );
}
