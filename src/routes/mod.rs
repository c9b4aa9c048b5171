use actix_web::web;

use crate::utils::response_utils::{json_error_handler, path_error_handler, query_error_handler};

/// Builds a test service with the fake backend and the default test config.
#[cfg(test)]
macro_rules! test_app {
    ($backend:expr) => {{
        let backend: std::sync::Arc<dyn crate::utils::backend_utils::BookingBackend> =
            std::sync::Arc::new($backend);

        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(crate::routes::test_config()))
                .app_data(actix_web::web::Data::from(backend))
                .app_data(actix_web::web::Data::new(
                    crate::utils::flow_utils::FlowStore::new(std::time::Duration::from_secs(60)),
                ))
                .configure(crate::routes::configure),
        )
        .await
    }};
}

pub mod admin_routes;
pub mod availability_routes;
pub mod booking_routes;
pub mod contact_routes;
pub mod flow_routes;
pub mod service_routes;
pub mod utils_routes;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .configure(service_routes::service_config)
        .configure(availability_routes::availability_config)
        .configure(booking_routes::booking_config)
        .configure(contact_routes::contact_config)
        .configure(flow_routes::flow_config)
        .configure(admin_routes::admin_config)
        .service(utils_routes::home)
        .default_service(web::to(utils_routes::route_not_found));
}

#[cfg(test)]
pub fn test_config() -> crate::config::Config {
    crate::config::Config::from_lookup(|name| {
        (name == "BACKEND_API_URL").then(|| "http://backend.test/api".to_string())
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    use crate::{structs::response_struct::ApiResponse, utils::fake_backend::FakeBackend};

    #[actix_web::test]
    async fn extractor_failures_name_the_request_part() {
        let app = test_app!(FakeBackend::default());

        let req = test::TestRequest::get().uri("/services/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ApiResponse<()> = test::read_body_json(resp).await;
        assert!(!body.success);
        assert!(body.message.unwrap().starts_with("Invalid URL segment:"));

        let req = test::TestRequest::get().uri("/slots?date=soon").to_request();
        let body: ApiResponse<()> = test::read_body_json(test::call_service(&app, req).await).await;
        assert!(body.message.unwrap().starts_with("Invalid query string:"));

        let req = test::TestRequest::post()
            .uri("/contact")
            .set_json(json!({"name": "Ana"}))
            .to_request();
        let body: ApiResponse<()> = test::read_body_json(test::call_service(&app, req).await).await;
        assert!(body.message.unwrap().starts_with("Invalid request body:"));
    }
}
