use actix_web::{HttpResponse, web};

use crate::{
    error::AppError,
    structs::response_struct::ApiResponse,
    utils::{backend_utils::BookingBackend, booking_utils::find_service},
};

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn get_all_services(backend: web::Data<dyn BookingBackend>) -> Result<HttpResponse, AppError> {
    let services: Vec<_> = backend
        .list_services()
        .await?
        .into_iter()
        .filter(|service| service.is_active)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(services, "Services retrieved successfully")))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn get_service_by_id(
    path: web::Path<i64>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let service = find_service(backend.list_services().await?, path.into_inner())?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(service, "Service retrieved successfully")))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

pub fn service_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/services")
            .route("", web::get().to(get_all_services))
            .route("/{id}", web::get().to(get_service_by_id)),
    );
}
