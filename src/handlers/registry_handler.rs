use crate::error::Result;
use crate::handlers::notifier::Notifier;
use crate::local_storage::attachment::Attachment;
use crate::local_storage::car::{Car, CarForm, CarLocalStorage};
use crate::local_storage::core_local_storage::CoreLocalStorage;
use crate::local_storage::driver::{Driver, DriverForm, DriverLocalStorage};
use crate::local_storage::order::{
    ActDocument, DeletedOrder, Order, OrderFilter, OrderLocalStorage, OrderUpdate,
};
use crate::local_storage::owner::{Owner, OwnerForm, OwnerKey, OwnerLocalStorage};
use crate::services::integrity_service::{IntegrityService, Presence};
use crate::services::plate_service;
use std::sync::Arc;

/// The surface the desktop client talks to. Every failure is reported to
/// the notifier once and then returned to the caller.
pub struct RegistryHandler {
    core_storage: Arc<CoreLocalStorage>,
    owners: OwnerLocalStorage,
    drivers: DriverLocalStorage,
    cars: CarLocalStorage,
    orders: OrderLocalStorage,
    integrity: IntegrityService,
    notifier: Arc<dyn Notifier>,
}

impl RegistryHandler {
    pub fn new(core_storage: Arc<CoreLocalStorage>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            owners: OwnerLocalStorage::new(core_storage.clone()),
            drivers: DriverLocalStorage::new(core_storage.clone()),
            cars: CarLocalStorage::new(core_storage.clone()),
            orders: OrderLocalStorage::new(core_storage.clone()),
            integrity: IntegrityService::new(core_storage.clone()),
            core_storage,
            notifier,
        }
    }

    fn report<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let category = err.category();
            tracing::debug!(operation, category = category.label(), "Rejected: {}", err);
            self.notifier.error(category.label(), &err.to_string());
        }
        result
    }

    pub fn initialize_schema(&self) -> Result<()> {
        self.report("initialize_schema", self.core_storage.initialize_schema())
    }

    pub fn set_owner(&self, form: &OwnerForm, owner_id: Option<i64>) -> Result<Owner> {
        self.report("set_owner", self.owners.save_owner(form, owner_id))
    }

    pub fn get_owner(&self, key: impl Into<OwnerKey>) -> Result<Owner> {
        self.report("get_owner", self.owners.get_owner(&key.into()))
    }

    pub fn get_owners(&self) -> Result<Vec<Owner>> {
        self.report("get_owners", self.owners.get_owners())
    }

    pub fn set_driver(&self, company_id: i64, form: &DriverForm, driver_id: Option<i64>) -> Result<Driver> {
        self.report("set_driver", self.drivers.save_driver(company_id, form, driver_id))
    }

    pub fn get_drivers(&self, owner_id: Option<i64>) -> Result<Vec<Driver>> {
        self.report("get_drivers", self.drivers.get_drivers(owner_id))
    }

    pub fn set_car(&self, company_id: i64, form: &CarForm, car_id: Option<i64>) -> Result<Car> {
        self.report("set_car", self.cars.save_car(company_id, form, car_id))
    }

    pub fn get_car(&self, plate: &str) -> Result<Car> {
        self.report("get_car", self.cars.get_car(plate))
    }

    pub fn get_cars(&self, owner_id: Option<i64>) -> Result<Vec<Car>> {
        self.report("get_cars", self.cars.get_cars(owner_id))
    }

    pub fn set_order(
        &self,
        company_id: i64,
        car_id: i64,
        driver_id: Option<i64>,
        car_mileage: Option<i64>,
    ) -> Result<Order> {
        self.report(
            "set_order",
            self.orders.create_order(company_id, car_id, driver_id, car_mileage),
        )
    }

    pub fn get_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        self.report("get_orders", self.orders.get_orders(filter))
    }

    pub fn update_order(&self, update: &OrderUpdate) -> Result<Order> {
        self.report("update_order", self.orders.update_order(update))
    }

    pub fn update_order_path(&self, order_id: i64, path: &str) -> Result<Order> {
        self.report("update_order_path", self.orders.update_order_path(order_id, path))
    }

    pub fn get_act(&self, order_id: i64) -> Result<ActDocument> {
        self.report("get_act", self.orders.get_act(order_id))
    }

    pub fn delete_order(&self, order_id: i64) -> Result<DeletedOrder> {
        let deleted = self.report("delete_order", self.orders.delete_order(order_id))?;
        self.notifier.done(&deleted.to_string());
        Ok(deleted)
    }

    pub fn check_presence(&self, presence: Presence) -> Result<()> {
        self.report("check_presence", self.integrity.check_presence(presence))
    }

    pub fn normalize_plate(
        &self,
        raw: &str,
        record_id: Option<i64>,
        attachment: Option<Attachment>,
    ) -> Result<String> {
        let result = plate_service::normalize_plate(raw, record_id, attachment).map_err(Into::into);
        self.report("normalize_plate", result)
    }
}
