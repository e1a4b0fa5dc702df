pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::backend::{CitasApiBackend, CitasBackend};
pub use services::booking::{AppointmentBookingService, AppointmentFilter};
pub use services::validator::{BookingMode, BookingValidator};
pub use services::time_window::TimeWindowPolicy;
