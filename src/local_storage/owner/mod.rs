pub mod owner_local_storage;
pub mod owner_tables;

pub use owner_local_storage::{Owner, OwnerForm, OwnerKey, OwnerLocalStorage};
pub use owner_tables::OwnerTable;
