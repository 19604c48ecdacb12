pub mod notifier;
pub mod registry_handler;

pub use notifier::{LogNotifier, Notifier, RecordingNotifier, Report};
pub use registry_handler::RegistryHandler;
