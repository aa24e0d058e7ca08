pub mod alert;

pub use alert::{Alert, AlertLevel, LogNotifier, Notifier, WebhookNotifier};
