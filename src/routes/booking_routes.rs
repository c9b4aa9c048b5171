use actix_web::{HttpResponse, web};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    structs::{
        flow_struct::ClientDetails, remote_struct::NewBooking, response_struct::ApiResponse,
        util_struct::BookingRequest,
    },
    utils::{
        backend_utils::BookingBackend,
        booking_utils::{check_booking, find_service},
        time_utils::{RawTimestamp, format_local_iso},
    },
};

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn create_booking(
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
    body: web::Json<BookingRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();

    let start = RawTimestamp::parse(&request.start_datetime)
        .and_then(|raw| raw.in_zone(&config.timezone))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "start_datetime: {} is not a valid local time.",
                request.start_datetime
            ))
        })?;

    let details = ClientDetails::normalized(
        &request.client_name,
        &request.client_email,
        request.client_phone.as_deref(),
    );
    details.validate()?;

    let service = find_service(backend.list_services().await?, request.service_id)?;
    check_booking(&service, request.duration_minutes, &start, &config.now())?;

    let new_booking = NewBooking {
        client_name: details.client_name,
        client_email: details.client_email,
        client_phone: details.client_phone,
        service_id: service.id,
        availability_id: request.availability_id,
        duration_minutes: request.duration_minutes,
        start_datetime: format_local_iso(&start),
    };

    let booking = backend.create_booking(&new_booking).await.map_err(|err| {
        warn!(error = %err, service_id = service.id, "Booking was not accepted");
        err
    })?;

    info!(booking_id = booking.id, service_id = service.id, "Booking requested");

    Ok(HttpResponse::Created().json(ApiResponse::ok(
        booking,
        "Booking request received. It stays pending until confirmed.",
    )))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

pub fn booking_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/bookings").route("", web::post().to(create_booking)));
}
