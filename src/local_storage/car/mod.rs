pub mod car_local_storage;
pub mod car_tables;

pub use car_local_storage::{Car, CarForm, CarLocalStorage};
pub use car_tables::{CarTable, PARTS_PLACEHOLDER};
