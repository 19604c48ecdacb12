pub mod attachment;
pub mod car;
pub mod core_local_storage;
pub mod driver;
pub mod order;
pub mod owner;

pub use core_local_storage::CoreLocalStorage;
