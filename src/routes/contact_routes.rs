use actix_web::{HttpResponse, web};
use tracing::info;
use validator::Validate;

use crate::{
    error::AppError,
    structs::{remote_struct::ContactForm, response_struct::ApiResponse},
    utils::backend_utils::BookingBackend,
};

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn send_message(
    backend: web::Data<dyn BookingBackend>,
    body: web::Json<ContactForm>,
) -> Result<HttpResponse, AppError> {
    let raw = body.into_inner();
    let form = ContactForm {
        name: raw.name.trim().to_string(),
        email: raw.email.trim().to_string(),
        phone: raw
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty()),
        message: raw.message.trim().to_string(),
    };
    form.validate()?;

    let ack = backend.submit_contact(&form).await?;
    info!("Contact message forwarded");

    let message = if ack.message.is_empty() {
        "Message sent.".to_string()
    } else {
        ack.message.clone()
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ack, &message)))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

pub fn contact_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/contact").route("", web::post().to(send_message)));
}
