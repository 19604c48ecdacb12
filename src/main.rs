use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use workshop_acts::config::Config;
use workshop_acts::handlers::{LogNotifier, RegistryHandler};
use workshop_acts::local_storage::CoreLocalStorage;
use workshop_acts::local_storage::order::OrderFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let core_storage = Arc::new(CoreLocalStorage::from_config(&config));
    let registry = RegistryHandler::new(core_storage, Arc::new(LogNotifier));

    registry
        .initialize_schema()
        .with_context(|| format!("failed to initialize {}", config.database_path))?;

    let owners = registry.get_owners()?;
    let open_acts = registry.get_orders(&OrderFilter::default())?;
    tracing::info!(
        "{} clients registered, {} acts in progress",
        owners.len(),
        open_acts.len()
    );

    for act in &open_acts {
        let client = owners
            .iter()
            .find(|owner| owner.id == act.company_id)
            .map(|owner| owner.company_name.as_str())
            .unwrap_or("?");
        println!(
            "№{}\t{}\t{}\tcar {}",
            act.act_number(),
            act.start_date.format("%d.%m.%Y"),
            client,
            act.car_id
        );
    }

    Ok(())
}
