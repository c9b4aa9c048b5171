use actix_web::{HttpResponse, web};
use tracing::info;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    middlewares::auth_middleware::AuthenticatedAdmin,
    structs::{
        remote_struct::{
            AvailabilityFilter, BookingStatus, CreateAvailability, CreateService, MessageAck,
            UpdateAvailability, UpdateService,
        },
        response_struct::ApiResponse,
        util_struct::{AdminAvailabilityQuery, AdminBadges},
    },
    utils::{backend_utils::BookingBackend, time_utils::RawTimestamp},
};

fn acknowledged(ack: MessageAck, fallback: &str) -> HttpResponse {
    let message = if ack.message.is_empty() {
        fallback.to_string()
    } else {
        ack.message
    };

    HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        data: None,
        message: Some(message),
    })
}

fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        data: None,
        message: Some(message.to_string()),
    })
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                  SERVICES                                  */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn list_services(
    _admin: AuthenticatedAdmin,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let services = backend.list_services().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(services, "Services retrieved successfully")))
}

async fn create_service(
    admin: AuthenticatedAdmin,
    backend: web::Data<dyn BookingBackend>,
    body: web::Json<CreateService>,
) -> Result<HttpResponse, AppError> {
    let mut new_service = body.into_inner();
    new_service.title = new_service.title.trim().to_string();
    new_service.validate()?;

    let service = backend.create_service(&admin.token, &new_service).await?;
    info!(service_id = service.id, "Service created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(service, "Service created successfully")))
}

async fn update_service(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
    body: web::Json<UpdateService>,
) -> Result<HttpResponse, AppError> {
    let mut changes = body.into_inner();

    if let Some(title) = &changes.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Service title cannot be empty.".to_string()));
        }
        changes.title = Some(title.to_string());
    }

    let service = backend
        .update_service(&admin.token, path.into_inner(), &changes)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(service, "Service updated successfully")))
}

async fn delete_service(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    backend.delete_service(&admin.token, id).await?;
    info!(service_id = id, "Service deleted");

    Ok(done("Service deleted successfully"))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                               AVAILABILITIES                               */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

fn check_span(
    start: &RawTimestamp,
    end: &RawTimestamp,
    config: &Config,
) -> Result<(), AppError> {
    let start = start.in_zone(&config.timezone);
    let end = end.in_zone(&config.timezone);

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(()),
        (Some(_), Some(_)) => Err(AppError::Validation(
            "end_datetime must be after start_datetime.".to_string(),
        )),
        _ => Err(AppError::Validation(
            "The window falls in a daylight saving gap.".to_string(),
        )),
    }
}

async fn list_availabilities(
    admin: AuthenticatedAdmin,
    query: web::Query<AdminAvailabilityQuery>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let filter = AvailabilityFilter {
        service: query.service,
        date: query.date,
    };
    let availabilities = backend.list_availabilities(Some(&admin.token), &filter).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        availabilities,
        "Availabilities retrieved successfully",
    )))
}

async fn create_availability(
    admin: AuthenticatedAdmin,
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
    body: web::Json<CreateAvailability>,
) -> Result<HttpResponse, AppError> {
    let availability = body.into_inner();
    check_span(&availability.start_datetime, &availability.end_datetime, &config)?;

    let ack = backend.create_availability(&admin.token, &availability).await?;

    Ok(acknowledged(ack, "Availability created"))
}

async fn update_availability(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
    body: web::Json<UpdateAvailability>,
) -> Result<HttpResponse, AppError> {
    let changes = body.into_inner();
    if let (Some(start), Some(end)) = (&changes.start_datetime, &changes.end_datetime) {
        check_span(start, end, &config)?;
    }

    let ack = backend
        .update_availability(&admin.token, path.into_inner(), &changes)
        .await?;

    Ok(acknowledged(ack, "Availability updated"))
}

async fn delete_availability(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let ack = backend
        .delete_availability(&admin.token, path.into_inner())
        .await?;

    Ok(acknowledged(ack, "Availability deleted"))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                  BOOKINGS                                  */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn list_bookings(
    admin: AuthenticatedAdmin,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let bookings = backend.list_bookings(&admin.token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(bookings, "Bookings retrieved successfully")))
}

async fn get_booking(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let booking = backend.get_booking(&admin.token, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(booking, "Booking retrieved successfully")))
}

async fn confirm_booking(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let ack = backend.confirm_booking(&admin.token, id).await?;
    info!(booking_id = id, "Booking confirmed");

    Ok(acknowledged(ack, "Booking confirmed"))
}

async fn cancel_booking(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let ack = backend.cancel_booking(&admin.token, id).await?;
    info!(booking_id = id, "Booking canceled");

    Ok(acknowledged(ack, "Booking canceled"))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                  MESSAGES                                  */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn list_messages(
    admin: AuthenticatedAdmin,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let messages = backend.list_messages(&admin.token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(messages, "Messages retrieved successfully")))
}

async fn mark_message_read(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    backend
        .mark_message_read(&admin.token, path.into_inner())
        .await?;

    Ok(done("Message marked as read"))
}

async fn delete_message(
    admin: AuthenticatedAdmin,
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    backend.delete_message(&admin.token, path.into_inner()).await?;

    Ok(done("Message deleted"))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn get_badges(
    admin: AuthenticatedAdmin,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let bookings = backend.list_bookings(&admin.token).await?;
    let messages = backend.list_messages(&admin.token).await?;

    let badges = AdminBadges {
        pending_bookings: bookings
            .iter()
            .filter(|booking| booking.status == BookingStatus::Pending)
            .count(),
        unread_messages: messages.iter().filter(|message| !message.is_read).count(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(badges, "Badges retrieved successfully")))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/badges", web::get().to(get_badges))
            .route("/services", web::get().to(list_services))
            .route("/services", web::post().to(create_service))
            .route("/services/{id}", web::patch().to(update_service))
            .route("/services/{id}", web::delete().to(delete_service))
            .route("/availabilities", web::get().to(list_availabilities))
            .route("/availabilities", web::post().to(create_availability))
            .route("/availabilities/{id}", web::patch().to(update_availability))
            .route("/availabilities/{id}", web::delete().to(delete_availability))
            .route("/bookings", web::get().to(list_bookings))
            .route("/bookings/{id}", web::get().to(get_booking))
            .route("/bookings/{id}/confirm", web::post().to(confirm_booking))
            .route("/bookings/{id}/cancel", web::post().to(cancel_booking))
            .route("/messages", web::get().to(list_messages))
            .route("/messages/{id}/read", web::post().to(mark_message_read))
            .route("/messages/{id}", web::delete().to(delete_message)),
    );
}
