use actix_web::{HttpResponse, web};
use tracing::warn;

use crate::{
    config::Config,
    error::AppError,
    structs::{
        remote_struct::AvailabilityFilter,
        response_struct::ApiResponse,
        util_struct::{AvailableDatesResponse, DateQuery, SlotQuery, SlotsResponse},
    },
    utils::{
        backend_utils::BookingBackend,
        booking_utils::find_service,
        slot_utils::{FALLBACK_DAYS, available_dates, fallback_dates, plan_slots, windows_from},
    },
};

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn get_windows(
    query: web::Query<DateQuery>,
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let filter = AvailabilityFilter {
        service: None,
        date: query.date,
    };
    let availabilities = backend.list_availabilities(None, &filter).await?;
    let windows = windows_from(&availabilities, &config.timezone);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(windows, "Availabilities retrieved successfully")))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn get_available_dates(
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let now = config.now();

    let response = match backend
        .list_availabilities(None, &AvailabilityFilter::default())
        .await
    {
        Ok(availabilities) => AvailableDatesResponse {
            dates: available_dates(&windows_from(&availabilities, &config.timezone), &now),
            fallback: false,
        },
        Err(err) => {
            warn!(error = %err, "Could not load availabilities, offering the next days instead");

            AvailableDatesResponse {
                dates: fallback_dates(now.date_naive(), FALLBACK_DAYS),
                fallback: true,
            }
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(response, "Available dates retrieved successfully")))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

async fn get_slots(
    query: web::Query<SlotQuery>,
    config: web::Data<Config>,
    backend: web::Data<dyn BookingBackend>,
) -> Result<HttpResponse, AppError> {
    let SlotQuery {
        date,
        service_id,
        duration_minutes,
    } = query.into_inner();

    let service = find_service(backend.list_services().await?, service_id)?;
    if !service.offers(duration_minutes) {
        return Err(AppError::Validation(format!(
            "{} is not offered for {} minutes.",
            service.title, duration_minutes
        )));
    }

    let filter = AvailabilityFilter {
        service: Some(service_id),
        date: Some(date),
    };
    let availabilities = backend.list_availabilities(None, &filter).await?;
    let windows = windows_from(&availabilities, &config.timezone);
    let slots = plan_slots(&windows, date, duration_minutes, &config.now());

    let response = SlotsResponse {
        date,
        service_id,
        duration_minutes,
        contact_fallback: slots.is_empty(),
        slots,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(response, "Slots computed successfully")))
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

pub fn availability_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/availabilities")
            .route("", web::get().to(get_windows))
            .route("/dates", web::get().to(get_available_dates)),
    )
    .route("/slots", web::get().to(get_slots));
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::{
        structs::response_struct::ApiResponse,
        utils::fake_backend::{FakeBackend, availability, service},
    };

    fn backend() -> FakeBackend {
        FakeBackend {
            services: vec![
                service(1, "Massage Relaxant", &[60, 90], true),
                service(2, "Massage Tonique", &[45], false),
            ],
            availabilities: vec![
                availability(7, "2030-05-02T09:00:00", "2030-05-02T12:00:00", false),
                availability(8, "2030-05-02T09:00:00+02:00", "2030-05-02T11:00:00+02:00", false),
                availability(9, "2030-05-02T14:00:00", "2030-05-02T15:00:00", false),
                availability(10, "2030-05-03T09:00:00", "2030-05-03T12:00:00", true),
                availability(11, "2030-05-06T10:00:00", "2030-05-06T12:00:00", false),
            ],
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn slots_are_planned_per_window() {
        let app = test_app!(backend());

        let req = test::TestRequest::get()
            .uri("/slots?date=2030-05-02&service_id=1&duration_minutes=60")
            .to_request();
        let body: ApiResponse<Value> = test::call_and_read_body_json(&app, req).await;
        let data = body.data.unwrap();

        let slots: Vec<(i64, String)> = data["slots"]
            .as_array()
            .unwrap()
            .iter()
            .map(|slot| {
                (
                    slot["availability_id"].as_i64().unwrap(),
                    slot["start"].as_str().unwrap().to_string(),
                )
            })
            .collect();

        // 09-12 gives 09 and 10; the overlapping 09-11 window repeats 09 under its own id;
        // 14-15 cannot fit the buffer.
        assert_eq!(
            slots,
            vec![
                (7, "2030-05-02T09:00:00+02:00".to_string()),
                (7, "2030-05-02T10:00:00+02:00".to_string()),
                (8, "2030-05-02T09:00:00+02:00".to_string()),
            ]
        );
        assert_eq!(data["contact_fallback"], false);
    }

    #[actix_web::test]
    async fn empty_day_offers_contact_fallback() {
        let app = test_app!(backend());

        let req = test::TestRequest::get()
            .uri("/slots?date=2030-05-04&service_id=1&duration_minutes=60")
            .to_request();
        let body: ApiResponse<Value> = test::call_and_read_body_json(&app, req).await;
        let data = body.data.unwrap();

        assert_eq!(data["slots"], Value::Array(Vec::new()));
        assert_eq!(data["contact_fallback"], true);
    }

    #[actix_web::test]
    async fn duration_must_be_offered() {
        let app = test_app!(backend());

        let req = test::TestRequest::get()
            .uri("/slots?date=2030-05-02&service_id=1&duration_minutes=45")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn malformed_query_is_a_bad_request() {
        let app = test_app!(backend());

        let req = test::TestRequest::get()
            .uri("/slots?date=02/05/2030&service_id=1&duration_minutes=60")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn dates_skip_booked_windows() {
        let app = test_app!(backend());

        let req = test::TestRequest::get().uri("/availabilities/dates").to_request();
        let body: ApiResponse<Value> = test::call_and_read_body_json(&app, req).await;
        let data = body.data.unwrap();

        assert_eq!(data["dates"], serde_json::json!(["2030-05-02", "2030-05-06"]));
        assert_eq!(data["fallback"], false);
    }

    #[actix_web::test]
    async fn dates_fall_back_to_next_week_when_backend_is_down() {
        let app = test_app!(FakeBackend {
            unreachable: true,
            ..backend()
        });

        let req = test::TestRequest::get().uri("/availabilities/dates").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiResponse<Value> = test::read_body_json(resp).await;
        let data = body.data.unwrap();
        assert_eq!(data["dates"].as_array().unwrap().len(), 7);
        assert_eq!(data["fallback"], true);
    }

    #[actix_web::test]
    async fn windows_are_rendered_with_offsets() {
        let app = test_app!(backend());

        let req = test::TestRequest::get()
            .uri("/availabilities?date=2030-05-06")
            .to_request();
        let body: ApiResponse<Value> = test::call_and_read_body_json(&app, req).await;
        let windows = body.data.unwrap();

        assert_eq!(windows[0]["id"], 11);
        assert_eq!(windows[0]["start"], "2030-05-06T10:00:00+02:00");
        assert_eq!(windows[0]["end"], "2030-05-06T12:00:00+02:00");
    }
}
