pub mod driver_local_storage;
pub mod driver_tables;

pub use driver_local_storage::{Driver, DriverForm, DriverLocalStorage};
pub use driver_tables::DriverTable;
