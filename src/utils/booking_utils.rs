use chrono::DateTime;
use chrono_tz::Tz;

use crate::{
    error::{AppError, BackendError, BookingRejection, RejectionKind},
    structs::remote_struct::Service,
    utils::slot_utils::check_lead_time,
};

/// Checks run before a booking is sent, so obvious refusals never reach the backend.
pub fn check_booking(
    service: &Service,
    duration_minutes: u32,
    start: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> Result<(), AppError> {
    if !service.is_active {
        return Err(AppError::Backend(BackendError::Rejected(BookingRejection::new(
            RejectionKind::Unknown,
            format!("{} is not available for booking at the moment.", service.title),
        ))));
    }

    if !service.offers(duration_minutes) {
        return Err(AppError::Validation(format!(
            "{} is not offered for {} minutes. Offered: {:?}.",
            service.title,
            duration_minutes,
            service.offered_durations()
        )));
    }

    check_lead_time(start, now).map_err(|rejection| AppError::Backend(BackendError::Rejected(rejection)))
}

pub fn find_service(services: Vec<Service>, service_id: i64) -> Result<Service, AppError> {
    services
        .into_iter()
        .find(|service| service.id == service_id)
        .ok_or_else(|| AppError::NotFound(format!("Service {service_id} does not exist.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;

    use crate::utils::fake_backend::service;

    fn now() -> DateTime<Tz> {
        Paris.with_ymd_and_hms(2030, 5, 2, 8, 0, 0).unwrap()
    }

    fn rejection_kind(err: AppError) -> Option<RejectionKind> {
        match err {
            AppError::Backend(BackendError::Rejected(rejection)) => Some(rejection.kind),
            _ => None,
        }
    }

    #[test]
    fn inactive_service_is_a_domain_rejection() {
        let inactive = service(1, "Massage Tonique", &[60], false);
        let start = Paris.with_ymd_and_hms(2030, 5, 2, 14, 0, 0).unwrap();

        let err = check_booking(&inactive, 60, &start, &now()).unwrap_err();
        assert_eq!(rejection_kind(err), Some(RejectionKind::Unknown));
    }

    #[test]
    fn unknown_duration_is_a_validation_error() {
        let relax = service(1, "Massage Relaxant", &[60, 90], true);
        let start = Paris.with_ymd_and_hms(2030, 5, 2, 14, 0, 0).unwrap();

        assert!(matches!(
            check_booking(&relax, 45, &start, &now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn start_within_two_hours_is_refused() {
        let relax = service(1, "Massage Relaxant", &[60], true);
        let too_soon = Paris.with_ymd_and_hms(2030, 5, 2, 9, 59, 0).unwrap();
        let just_in_time = Paris.with_ymd_and_hms(2030, 5, 2, 10, 0, 0).unwrap();

        let err = check_booking(&relax, 60, &too_soon, &now()).unwrap_err();
        assert_eq!(rejection_kind(err), Some(RejectionKind::LeadTimeViolation));
        assert!(check_booking(&relax, 60, &just_in_time, &now()).is_ok());
    }

    #[test]
    fn missing_service_is_not_found() {
        let services = vec![service(1, "Massage Relaxant", &[60], true)];

        assert!(find_service(services.clone(), 1).is_ok());
        assert!(matches!(find_service(services, 9), Err(AppError::NotFound(_))));
    }
}
