pub mod order_local_storage;
pub mod order_tables;

pub use order_local_storage::{
    ActDocument, DeletedOrder, Order, OrderFilter, OrderLocalStorage, OrderScope, OrderStatus,
    OrderUpdate, next_prefix,
};
pub use order_tables::OrderTable;
