use crate::error::{ErrorCategory, RegistryError, Result};
use crate::handlers::{RecordingNotifier, RegistryHandler, Report};
use crate::local_storage::CoreLocalStorage;
use crate::local_storage::attachment::Attachment;
use crate::local_storage::car::{Car, CarForm, PARTS_PLACEHOLDER};
use crate::local_storage::driver::{Driver, DriverForm};
use crate::local_storage::order::{OrderFilter, OrderScope, OrderStatus, OrderUpdate};
use crate::local_storage::owner::{Owner, OwnerForm, OwnerKey};
use crate::services::Presence;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

// Every test gets its own database file
fn setup_test_db() -> (PathBuf, RegistryHandler, Arc<RecordingNotifier>) {
    let db_path = std::env::temp_dir().join(format!("workshop_acts_test_{}.db", Uuid::new_v4()));

    crate::initialize_database(db_path.clone()).expect("Failed to initialize database");

    let notifier = Arc::new(RecordingNotifier::new());
    let registry = RegistryHandler::new(
        Arc::new(CoreLocalStorage::new(db_path.clone())),
        notifier.clone(),
    );

    (db_path, registry, notifier)
}

fn teardown_test_db(db_path: &Path) {
    if db_path.exists() {
        fs::remove_file(db_path).expect("Failed to remove test database");
    }
}

fn create_test_owner(registry: &RegistryHandler, name: &str, unp_code: &str) -> Owner {
    let form = OwnerForm {
        company_name: name.to_string(),
        company_full_name: format!("LLC \"{}\"", name),
        unp_code: unp_code.to_string(),
        company_address: "Minsk".to_string(),
        company_phone: "666".to_string(),
    };
    registry.set_owner(&form, None).expect("Failed to save owner")
}

fn create_test_car(registry: &RegistryHandler, owner_id: i64, number: &str) -> Car {
    let form = CarForm {
        brand: "MAZ".to_string(),
        model: "5440".to_string(),
        number: number.to_string(),
        uzm_code: "UZM5440F8".to_string(),
        year: "2007".to_string(),
        attachment: Some(Attachment::Vehicle),
    };
    registry.set_car(owner_id, &form, None).expect("Failed to save car")
}

fn create_test_driver(registry: &RegistryHandler, owner_id: i64, name: &str) -> Driver {
    let form = DriverForm {
        name: name.to_string(),
        lastname: "rustam".to_string(),
        position: "mechanic".to_string(),
        mobile_phone: " 888855 ".to_string(),
    };
    registry
        .set_driver(owner_id, &form, None)
        .expect("Failed to save driver")
}

fn last_error_category(notifier: &RecordingNotifier) -> Option<String> {
    match notifier.last() {
        Some(Report::Error { category, .. }) => Some(category),
        _ => None,
    }
}

#[cfg(test)]
mod owner_tests {
    use super::*;

    #[test]
    fn test_owner_crud_operations() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();

        let bams = create_test_owner(&registry, "BAMS", "222333444");
        let sgp = create_test_owner(&registry, "SGP", "111222333");

        assert_eq!(sgp.company_full_name, "LLC «SGP»");
        assert_eq!(sgp.company_address.as_deref(), Some("Minsk"));

        assert_eq!(registry.get_owner(sgp.id)?, sgp);
        assert_eq!(registry.get_owner("BAMS")?, bams);
        assert_eq!(registry.get_owner(OwnerKey::Name(" SGP ".into()))?.id, sgp.id);

        let names: Vec<String> = registry
            .get_owners()?
            .into_iter()
            .map(|o| o.company_name)
            .collect();
        assert_eq!(names, vec!["BAMS", "SGP"]);

        // Only the phone is supplied
        let form = OwnerForm {
            company_phone: "777".to_string(),
            ..Default::default()
        };
        let updated = registry.set_owner(&form, Some(sgp.id))?;
        assert_eq!(updated.company_phone.as_deref(), Some("777"));
        assert_eq!(updated.company_name, "SGP");
        assert_eq!(updated.unp_code, "111222333");
        assert_eq!(updated.company_full_name, "LLC «SGP»");

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_duplicate_tax_code_is_rejected() -> Result<()> {
        let (db_path, registry, notifier) = setup_test_db();

        create_test_owner(&registry, "SGP", "111222333");
        let form = OwnerForm {
            company_name: "NEVA".to_string(),
            company_full_name: "NEVA".to_string(),
            unp_code: "111222333".to_string(),
            ..Default::default()
        };
        let err = registry.set_owner(&form, None).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Integrity);
        assert_eq!(last_error_category(&notifier).as_deref(), Some("IntegrityError"));
        assert_eq!(registry.get_owners()?.len(), 1);

        // Changing another client's code to a taken one fails the same way
        let neva = create_test_owner(&registry, "NEVA", "333444555");
        let steal = OwnerForm {
            unp_code: "111222333".to_string(),
            ..Default::default()
        };
        let err = registry.set_owner(&steal, Some(neva.id)).unwrap_err();
        assert!(matches!(err, RegistryError::Integrity(_)));
        assert_eq!(registry.get_owner(neva.id)?.unp_code, "333444555");

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_owner_required_fields() {
        let (db_path, registry, notifier) = setup_test_db();

        let form = OwnerForm {
            company_name: "   ".to_string(),
            company_full_name: "Nameless".to_string(),
            unp_code: "123".to_string(),
            ..Default::default()
        };
        let err = registry.set_owner(&form, None).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert_eq!(last_error_category(&notifier).as_deref(), Some("ValueError"));

        let form = OwnerForm {
            company_name: "Arena".to_string(),
            company_full_name: "Arena".to_string(),
            unp_code: "12a".to_string(),
            ..Default::default()
        };
        assert!(registry.set_owner(&form, None).is_err());

        teardown_test_db(&db_path);
    }

    #[test]
    fn test_unknown_owner_is_not_found() {
        let (db_path, registry, notifier) = setup_test_db();

        let err = registry.get_owner(42).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(registry.get_owner("Nobody").is_err());

        let form = OwnerForm {
            company_name: "Ghost".to_string(),
            ..Default::default()
        };
        let err = registry.set_owner(&form, Some(42)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(notifier.reports().len(), 3);

        teardown_test_db(&db_path);
    }
}

#[cfg(test)]
mod car_tests {
    use super::*;

    #[test]
    fn test_plate_is_normalized_on_create_and_lookup() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");

        let car = create_test_car(&registry, owner.id, "1234АА5");
        assert_eq!(car.number, "1234 AA-5");
        assert_eq!(car.year, Some(2007));
        assert_eq!(car.attachment, Attachment::Vehicle);

        assert_eq!(registry.get_car("1234aa5")?, car);
        assert_eq!(registry.get_car("1234 AA-5")?, car);

        let foreign = create_test_car(&registry, owner.id, "RU A111AA22");
        assert_eq!(foreign.number, "A111AA22");

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_duplicate_plate_is_rejected() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let sgp = create_test_owner(&registry, "SGP", "111222333");
        let bams = create_test_owner(&registry, "BAMS", "222333444");

        create_test_car(&registry, sgp.id, "1338AA5");
        let form = CarForm {
            number: "1338 аа-5".to_string(),
            attachment: Some(Attachment::Trailer),
            ..Default::default()
        };
        let err = registry.set_car(bams.id, &form, None).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Integrity);
        assert!(registry.get_cars(Some(bams.id))?.is_empty());

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_partial_update_keeps_other_fields() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");
        let car = create_test_car(&registry, owner.id, "1226BB7");

        let form = CarForm {
            brand: "  MTM ".to_string(),
            ..Default::default()
        };
        let updated = registry.set_car(owner.id, &form, Some(car.id))?;

        assert_eq!(updated.id, car.id);
        assert_eq!(updated.brand, "MTM");
        assert_eq!(updated.number, car.number);
        assert_eq!(updated.model, car.model);
        assert_eq!(updated.year, car.year);
        assert_eq!(updated.uzm_code, car.uzm_code);
        assert_eq!(updated.attachment, car.attachment);

        // A changed plate goes through normalization again
        let form = CarForm {
            number: "5454ее7".to_string(),
            ..Default::default()
        };
        assert_eq!(registry.set_car(owner.id, &form, Some(car.id))?.number, "5454 EE-7");

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_update_requires_car_of_the_same_client() {
        let (db_path, registry, _) = setup_test_db();
        let sgp = create_test_owner(&registry, "SGP", "111222333");
        let bams = create_test_owner(&registry, "BAMS", "222333444");
        let car = create_test_car(&registry, sgp.id, "1226BB7");

        let form = CarForm {
            brand: "Volvo".to_string(),
            ..Default::default()
        };
        let err = registry.set_car(bams.id, &form, Some(car.id)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);
        assert_eq!(registry.get_car("1226BB7").unwrap().brand, "MAZ");

        teardown_test_db(&db_path);
    }

    #[test]
    fn test_invalid_plate_is_reported_and_not_stored() -> Result<()> {
        let (db_path, registry, notifier) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");

        let form = CarForm {
            number: "1234ZZ5".to_string(),
            attachment: Some(Attachment::Vehicle),
            ..Default::default()
        };
        let err = registry.set_car(owner.id, &form, None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Type);
        assert_eq!(last_error_category(&notifier).as_deref(), Some("TypeError"));

        let form = CarForm {
            number: "1234AA8".to_string(),
            attachment: Some(Attachment::Vehicle),
            ..Default::default()
        };
        assert_eq!(
            registry.set_car(owner.id, &form, None).unwrap_err().category(),
            ErrorCategory::Type
        );

        let form = CarForm {
            attachment: Some(Attachment::Vehicle),
            ..Default::default()
        };
        assert_eq!(
            registry.set_car(owner.id, &form, None).unwrap_err().category(),
            ErrorCategory::Value
        );

        assert!(registry.get_cars(None)?.is_empty());

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_spare_parts_record() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");

        let form = CarForm {
            number: "ENGINE PARTS".to_string(),
            ..Default::default()
        };
        let parts = registry.set_car(owner.id, &form, None)?;
        assert_eq!(parts.attachment, Attachment::SpareParts);
        assert_eq!(parts.number, format!("{}: Engine parts", parts.id));
        assert_eq!(parts.brand, PARTS_PLACEHOLDER);
        assert_eq!(parts.model, PARTS_PLACEHOLDER);

        // A second parts record does not collide with the first
        let more = registry.set_car(owner.id, &CarForm::default(), None)?;
        assert_eq!(more.number, format!("{}: {}", more.id, PARTS_PLACEHOLDER));

        assert_eq!(registry.get_car(&parts.number)?.id, parts.id);

        // Turning parts into a vehicle needs a real plate
        let form = CarForm {
            attachment: Some(Attachment::Vehicle),
            ..Default::default()
        };
        assert!(registry.set_car(owner.id, &form, Some(parts.id)).is_err());

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_vehicle_never_gets_parts_placeholder() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");

        for attachment in [Attachment::Vehicle, Attachment::Trailer] {
            let form = CarForm {
                number: if attachment == Attachment::Vehicle { "1226BB7" } else { "1338AA5" }.to_string(),
                attachment: Some(attachment),
                ..Default::default()
            };
            let car = registry.set_car(owner.id, &form, None)?;
            assert_ne!(car.brand, PARTS_PLACEHOLDER);
            assert_ne!(car.model, PARTS_PLACEHOLDER);
            assert_eq!(car.brand, "");
            assert_eq!(car.uzm_code, None);
        }

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_vehicle_turned_into_parts_is_relabeled() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");
        let car = create_test_car(&registry, owner.id, "1226BB7");

        let form = CarForm {
            attachment: Some(Attachment::SpareParts),
            ..Default::default()
        };
        let parts = registry.set_car(owner.id, &form, Some(car.id))?;
        assert_eq!(parts.attachment, Attachment::SpareParts);
        assert_eq!(parts.number, format!("{}: {}", car.id, PARTS_PLACEHOLDER));

        // The freed plate can be registered again
        let other = create_test_car(&registry, owner.id, "1226 BB-7");
        assert_ne!(other.id, car.id);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_parts_label_is_rebuilt_on_update() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");
        let parts = registry.set_car(owner.id, &CarForm::default(), None)?;

        let form = CarForm {
            number: "  oil FILTERS ".to_string(),
            ..Default::default()
        };
        let relabeled = registry.set_car(owner.id, &form, Some(parts.id))?;
        assert_eq!(relabeled.number, format!("{}: Oil filters", parts.id));
        assert_eq!(relabeled.attachment, Attachment::SpareParts);
        assert_eq!(registry.get_car(&relabeled.number)?.id, parts.id);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_fleet_listing() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let sgp = create_test_owner(&registry, "SGP", "111222333");
        let bams = create_test_owner(&registry, "BAMS", "222333444");

        create_test_car(&registry, bams.id, "5454EE7");
        create_test_car(&registry, bams.id, "1338AA5");
        create_test_car(&registry, sgp.id, "1226BB7");

        let fleet: Vec<String> = registry
            .get_cars(Some(bams.id))?
            .into_iter()
            .map(|c| c.number)
            .collect();
        assert_eq!(fleet, vec!["1338 AA-5", "5454 EE-7"]);
        assert_eq!(registry.get_cars(None)?.len(), 3);

        let err = registry.get_cars(Some(99)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(
            registry.get_car("7777AA7").unwrap_err().category(),
            ErrorCategory::NotFound
        );

        teardown_test_db(&db_path);
        Ok(())
    }
}

#[cfg(test)]
mod driver_tests {
    use super::*;

    #[test]
    fn test_driver_crud_operations() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let sgp = create_test_owner(&registry, "SGP", "111222333");
        let bams = create_test_owner(&registry, "BAMS", "222333444");

        let vasil = create_test_driver(&registry, bams.id, "vasil");
        let oleg = create_test_driver(&registry, bams.id, "OLEG");
        create_test_driver(&registry, sgp.id, "vadim");

        assert_eq!(oleg.name.as_deref(), Some("Oleg"));
        assert_eq!(oleg.lastname.as_deref(), Some("Rustam"));
        assert_eq!(oleg.position.as_deref(), Some("Mechanic"));
        assert_eq!(oleg.mobile_phone.as_deref(), Some("888855"));
        assert_eq!(oleg.company_id, Some(bams.id));

        let staff: Vec<i64> = registry.get_drivers(Some(bams.id))?.iter().map(|d| d.id).collect();
        assert_eq!(staff, vec![oleg.id, vasil.id]);
        assert_eq!(registry.get_drivers(None)?.len(), 3);

        let nameless = registry.set_driver(sgp.id, &DriverForm::default(), None)?;
        assert_eq!(nameless.name, None);
        assert_eq!(nameless.display_name(), format!("#{}", nameless.id));

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_driver_update_touches_drivers_only() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");
        let car = create_test_car(&registry, owner.id, "1226BB7");
        let driver = create_test_driver(&registry, owner.id, "oleg");
        assert_eq!(car.id, driver.id);

        let form = DriverForm {
            position: "head of fleet".to_string(),
            ..Default::default()
        };
        let updated = registry.set_driver(owner.id, &form, Some(driver.id))?;

        assert_eq!(updated.position.as_deref(), Some("Head of fleet"));
        assert_eq!(updated.name, driver.name);
        assert_eq!(updated.mobile_phone, driver.mobile_phone);
        assert_eq!(registry.get_car("1226BB7")?, car);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_driver_of_another_client_is_rejected() {
        let (db_path, registry, _) = setup_test_db();
        let sgp = create_test_owner(&registry, "SGP", "111222333");
        let bams = create_test_owner(&registry, "BAMS", "222333444");
        let driver = create_test_driver(&registry, sgp.id, "oleg");

        let form = DriverForm {
            name: "Vasil".to_string(),
            ..Default::default()
        };
        let err = registry.set_driver(bams.id, &form, Some(driver.id)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);

        let err = registry.set_driver(99, &form, None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        teardown_test_db(&db_path);
    }
}

#[cfg(test)]
mod integrity_tests {
    use super::*;

    #[test]
    fn test_car_must_belong_to_claimed_client() -> Result<()> {
        let (db_path, registry, notifier) = setup_test_db();
        let owner_a = create_test_owner(&registry, "SGP", "111222333");
        let owner_b = create_test_owner(&registry, "BAMS", "222333444");
        let car_x = create_test_car(&registry, owner_a.id, "1226BB7");

        registry.check_presence(Presence::Owner(owner_a.id))?;
        registry.check_presence(Presence::Car {
            car_id: car_x.id,
            owner_id: owner_a.id,
        })?;

        let err = registry
            .check_presence(Presence::Car {
                car_id: car_x.id,
                owner_id: owner_b.id,
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);
        assert!(err.to_string().contains("BAMS"));
        assert_eq!(last_error_category(&notifier).as_deref(), Some("IntegrityError"));

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_missing_rows_are_not_found() {
        let (db_path, registry, _) = setup_test_db();
        let owner = create_test_owner(&registry, "SGP", "111222333");

        let err = registry.check_presence(Presence::Owner(owner.id + 1)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = registry
            .check_presence(Presence::Driver {
                driver_id: 5,
                owner_id: owner.id,
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("SGP"));

        let err = registry
            .check_presence(Presence::Car {
                car_id: 5,
                owner_id: 77,
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        teardown_test_db(&db_path);
    }
}

#[cfg(test)]
mod order_tests {
    use super::*;

    struct Fixture {
        sgp: Owner,
        bams: Owner,
        sgp_car: Car,
        bams_car: Car,
        sgp_driver: Driver,
        bams_driver: Driver,
    }

    fn create_fixture(registry: &RegistryHandler) -> Fixture {
        let sgp = create_test_owner(registry, "SGP", "111222333");
        let bams = create_test_owner(registry, "BAMS", "222333444");
        Fixture {
            sgp_car: create_test_car(registry, sgp.id, "1226BB7"),
            bams_car: create_test_car(registry, bams.id, "1338AA5"),
            sgp_driver: create_test_driver(registry, sgp.id, "vadim"),
            bams_driver: create_test_driver(registry, bams.id, "oleg"),
            sgp,
            bams,
        }
    }

    #[test]
    fn test_order_lifecycle() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);

        let order = registry.set_order(f.sgp.id, f.sgp_car.id, Some(f.sgp_driver.id), None)?;
        assert!(order.opening_order);
        assert!(order.first_open);
        assert_eq!(order.finish_date, None);
        assert_eq!(order.prefix, "A");
        assert_eq!(order.car_mileage, 0);
        assert_eq!(order.status(), OrderStatus::Open);

        let closed = registry.update_order(&OrderUpdate {
            order_id: Some(order.id),
            opening_order: false,
            ..Default::default()
        })?;
        assert!(!closed.opening_order);
        assert!(closed.finish_date.is_some());

        let closed_list = registry.get_orders(&OrderFilter {
            scope: None,
            status: OrderStatus::Closed,
        })?;
        assert_eq!(closed_list, vec![closed.clone()]);
        assert!(registry.get_orders(&OrderFilter::default())?.is_empty());

        let reopened = registry.update_order(&OrderUpdate {
            order_id: Some(order.id),
            ..Default::default()
        })?;
        assert!(reopened.opening_order);
        assert_eq!(reopened.finish_date, None);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_prefix_rollover() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);
        let order = registry.set_order(f.sgp.id, f.sgp_car.id, None, Some(120_000))?;

        let rollover = OrderUpdate {
            order_id: Some(order.id),
            rollover_prefix: true,
            ..Default::default()
        };
        let revised = registry.update_order(&rollover)?;
        assert_eq!(revised.id, order.id);
        assert_eq!(revised.prefix, "B");
        assert!(!revised.first_open);
        assert_eq!(revised.car_mileage, 120_000);

        for _ in 'C'..='Z' {
            registry.update_order(&rollover)?;
        }
        let err = registry.update_order(&rollover).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));

        let current = registry.get_act(order.id)?.order;
        assert_eq!(current.prefix, "Z");

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_order_requires_cars_and_drivers_of_the_client() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);

        let err = registry.set_order(f.sgp.id, f.bams_car.id, None, None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);

        let err = registry
            .set_order(f.sgp.id, f.sgp_car.id, Some(f.bams_driver.id), None)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);

        let err = registry.set_order(f.sgp.id, f.sgp_car.id, None, Some(-5)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Value);

        assert!(registry.get_orders(&OrderFilter::default())?.is_empty());

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_rejected_update_writes_nothing() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);
        let order = registry.set_order(f.sgp.id, f.sgp_car.id, None, None)?;

        let err = registry
            .update_order(&OrderUpdate {
                order_id: Some(order.id),
                rollover_prefix: true,
                car_mileage: Some(5000),
                driver_id: Some(f.bams_driver.id),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);

        // Moving the act to another client keeps the old car, which is not theirs
        let err = registry
            .update_order(&OrderUpdate {
                order_id: Some(order.id),
                company_id: Some(f.bams.id),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);

        assert_eq!(registry.get_act(order.id)?.order, order);

        let moved = registry.update_order(&OrderUpdate {
            order_id: Some(order.id),
            company_id: Some(f.bams.id),
            car_id: Some(f.bams_car.id),
            driver_id: Some(f.bams_driver.id),
            ..Default::default()
        })?;
        assert_eq!(moved.company_id, f.bams.id);
        assert_eq!(moved.car_id, f.bams_car.id);
        assert_eq!(moved.driver_id, Some(f.bams_driver.id));

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_update_without_id_opens_new_act() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);

        let created = registry.update_order(&OrderUpdate {
            company_id: Some(f.bams.id),
            car_id: Some(f.bams_car.id),
            car_mileage: Some(42),
            ..Default::default()
        })?;
        assert_eq!(created.prefix, "A");
        assert_eq!(created.car_mileage, 42);
        assert!(created.first_open);

        let err = registry
            .update_order(&OrderUpdate {
                car_id: Some(f.bams_car.id),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Value);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_dates_and_mileage_overwrite() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);
        let order = registry.set_order(f.sgp.id, f.sgp_car.id, None, None)?;

        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let finish = chrono::NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();

        let err = registry
            .update_order(&OrderUpdate {
                order_id: Some(order.id),
                finish_date: Some(finish),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Value);

        let closed = registry.update_order(&OrderUpdate {
            order_id: Some(order.id),
            start_date: Some(start),
            finish_date: Some(finish),
            car_mileage: Some(310_500),
            opening_order: false,
            ..Default::default()
        })?;
        assert_eq!(closed.start_date, start);
        assert_eq!(closed.finish_date, Some(finish));
        assert_eq!(closed.car_mileage, 310_500);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_order_listing_filters() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);

        let first = registry.set_order(f.sgp.id, f.sgp_car.id, None, None)?;
        let second = registry.set_order(f.bams.id, f.bams_car.id, None, None)?;
        let third = registry.set_order(f.sgp.id, f.sgp_car.id, None, None)?;
        registry.update_order(&OrderUpdate {
            order_id: Some(third.id),
            opening_order: false,
            ..Default::default()
        })?;

        let ids = |filter: OrderFilter| -> Result<Vec<i64>> {
            Ok(registry.get_orders(&filter)?.iter().map(|o| o.id).collect())
        };

        assert_eq!(ids(OrderFilter::default())?, vec![first.id, second.id]);
        assert_eq!(
            ids(OrderFilter {
                scope: Some(OrderScope::Owner(f.sgp.id)),
                status: OrderStatus::Open,
            })?,
            vec![first.id]
        );
        assert_eq!(
            ids(OrderFilter {
                scope: Some(OrderScope::Owner(f.sgp.id)),
                status: OrderStatus::Closed,
            })?,
            vec![third.id]
        );
        assert_eq!(
            ids(OrderFilter {
                scope: Some(OrderScope::Car(f.bams_car.id)),
                status: OrderStatus::Open,
            })?,
            vec![second.id]
        );
        assert!(
            ids(OrderFilter {
                scope: Some(OrderScope::Car(f.bams_car.id)),
                status: OrderStatus::Closed,
            })?
            .is_empty()
        );

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_act_document_and_path() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let f = create_fixture(&registry);
        let order = registry.set_order(f.sgp.id, f.sgp_car.id, Some(f.sgp_driver.id), Some(1500))?;
        registry.update_order(&OrderUpdate {
            order_id: Some(order.id),
            opening_order: false,
            ..Default::default()
        })?;

        let act = registry.get_act(order.id)?;
        assert_eq!(act.owner, f.sgp);
        assert_eq!(act.car, f.sgp_car);
        assert_eq!(act.driver.as_ref(), Some(&f.sgp_driver));
        assert_eq!(act.templates(), &["act_repair", "act_work", "order"]);

        let context = act.to_json();
        assert_eq!(context["order_number"], format!("{}-A", order.id));
        assert_eq!(context["name"], "SGP");
        assert_eq!(context["car_number"], "1226 BB-7");
        assert_eq!(context["driver"], "Vadim Rustam");
        assert_eq!(context["mphone"], "888855");
        assert_eq!(context["mileage"], 1500);

        // Writing the rendered path back leaves the act closed
        let saved = registry.update_order_path(order.id, "OrderBDFile/SGP/act_repair.docx")?;
        assert_eq!(saved.document_path.as_deref(), Some("OrderBDFile/SGP/act_repair.docx"));
        assert!(!saved.opening_order);
        assert!(saved.finish_date.is_some());

        assert_eq!(
            registry.get_act(999).unwrap_err().category(),
            ErrorCategory::NotFound
        );

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_delete_order() -> Result<()> {
        let (db_path, registry, notifier) = setup_test_db();
        let f = create_fixture(&registry);
        let order = registry.set_order(f.bams.id, f.bams_car.id, None, None)?;

        let deleted = registry.delete_order(order.id)?;
        assert_eq!(deleted.id, order.id);
        assert_eq!(deleted.prefix, "A");
        assert_eq!(deleted.company_name, "BAMS");
        assert_eq!(notifier.last(), Some(Report::Done(deleted.to_string())));
        assert!(deleted.to_string().starts_with(&format!("Deleted act №{}-A from ", order.id)));

        let err = registry.delete_order(order.id).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(last_error_category(&notifier).as_deref(), Some("NotFoundError"));

        // The car and client are untouched
        assert_eq!(registry.get_car("1338AA5")?, f.bams_car);
        assert_eq!(registry.get_owner(f.bams.id)?, f.bams);

        teardown_test_db(&db_path);
        Ok(())
    }
}

#[cfg(test)]
mod schema_tests {
    use super::*;
    use crate::local_storage::attachment::AttachmentTable;
    use crate::local_storage::owner::OwnerTable;

    #[test]
    fn test_schema_is_seeded_once() -> Result<()> {
        let (db_path, registry, _) = setup_test_db();
        let storage = CoreLocalStorage::new(db_path.clone());
        assert_eq!(storage.db_path(), db_path.as_path());

        create_test_owner(&registry, "SGP", "111222333");
        registry.initialize_schema()?;

        assert_eq!(storage.count(AttachmentTable::TABLE_NAME)?, 3);
        assert_eq!(storage.count(OwnerTable::TABLE_NAME)?, 1);

        teardown_test_db(&db_path);
        Ok(())
    }

    #[test]
    fn test_normalize_plate_reports_rejections() -> Result<()> {
        let (db_path, registry, notifier) = setup_test_db();

        assert_eq!(registry.normalize_plate("1234 ав 5", None, None)?, "1234 AB-5");
        assert_eq!(
            registry.normalize_plate("", Some(4), Some(Attachment::SpareParts))?,
            format!("4: {}", PARTS_PLACEHOLDER)
        );
        assert!(notifier.reports().is_empty());

        let err = registry.normalize_plate("123AA5", None, None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Value);
        assert_eq!(last_error_category(&notifier).as_deref(), Some("ValueError"));

        teardown_test_db(&db_path);
        Ok(())
    }
}
