//! The bot itself
//!
//! Polls the homework API and relays status changes and failures to a chat.

mod notifier;
mod poller;

pub use notifier::{NotificationError, Notifier, TelegramNotifier};
pub use poller::{CycleOutcome, Poller};
