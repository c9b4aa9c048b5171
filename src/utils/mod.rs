pub mod auth_utils;
pub mod backend_utils;
pub mod booking_utils;
pub mod flow_utils;
pub mod response_utils;
pub mod slot_utils;
pub mod time_utils;

#[cfg(test)]
pub mod fake_backend;
