use actix_web::{HttpResponse, Responder, get, web};
use tracing::error;

use crate::structs::response_struct::ApiResponse;

#[get("/")]
pub async fn home() -> impl Responder {
    Ok::<web::Json<ApiResponse<()>>, actix_web::Error>(web::Json(ApiResponse::<()> {
        success: true,
        data: None,
        message: Some("Booking gateway is up.".to_string()),
    }))
}

pub async fn route_not_found() -> impl Responder {
    not_found_response("404 Not Found".to_string())
}

fn failure(mut builder: actix_web::HttpResponseBuilder, message: String) -> HttpResponse {
    builder.json(ApiResponse::<()> {
        success: false,
        data: None,
        message: Some(message),
    })
}

pub fn not_found_response(message: String) -> HttpResponse {
    failure(HttpResponse::NotFound(), message)
}

pub fn bad_request_response(message: String) -> HttpResponse {
    failure(HttpResponse::BadRequest(), message)
}

pub fn conflict_response(message: String) -> HttpResponse {
    failure(HttpResponse::Conflict(), message)
}

pub fn unauthorized_response(message: String) -> HttpResponse {
    failure(HttpResponse::Unauthorized(), message)
}

pub fn bad_gateway_response(message: String) -> HttpResponse {
    error!("Backend failure: {}", message);

    failure(
        HttpResponse::BadGateway(),
        "The booking service is unavailable right now. Please try again.".to_string(),
    )
}
