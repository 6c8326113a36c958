//! Alert system.
//!
//! Operator notifications with a fixed severity set. Delivery is
//! fire-and-forget: a notifier logs its own failures and never returns them.

mod notifier;

pub use notifier::{Alert, AlertLevel, ConsoleNotifier, MultiNotifier, Notifier, TelegramNotifier};
