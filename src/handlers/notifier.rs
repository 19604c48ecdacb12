use crate::error::ErrorCategory;
use std::sync::Mutex;

/// Where the registry reports rejected operations and completed destructive ones.
/// The receiver decides how to present them.
pub trait Notifier: Send + Sync {
    fn error(&self, category: &str, message: &str);
    fn done(&self, message: &str);
}

/// Forwards reports to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, category: &str, message: &str) {
        if category == ErrorCategory::Database.label() {
            tracing::error!(category, "{}", message);
        } else {
            tracing::warn!(category, "{}", message);
        }
    }

    fn done(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Error { category: String, message: String },
    Done(String),
}

/// Keeps every report in memory, for headless callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    reports: Mutex<Vec<Report>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Report> {
        self.reports().pop()
    }

    fn push(&self, report: Report) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, category: &str, message: &str) {
        self.push(Report::Error {
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    fn done(&self, message: &str) {
        self.push(Report::Done(message.to_string()));
    }
}
