pub mod integrity_service;
pub mod plate_service;

pub use integrity_service::{IntegrityService, Presence};
pub use plate_service::normalize_plate;
