//! # Homework Bot
//!
//! Watches a homework review API and relays status changes to a Telegram chat.
//!
//! ## Architecture
//!
//! - **API**: authenticated polling client and response shape checks
//! - **Models**: homework records and status verdicts
//! - **Bot**: the polling loop and chat notifier
//!
//! ## Quick Start
//!
//! ```bash
//! export PRACTICUM_TOKEN=... TELEGRAM_TOKEN=... TELEGRAM_CHAT_ID=...
//! homework-bot
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::api::{HomeworkSource, PracticumClient};
    pub use crate::bot::{Notifier, Poller, TelegramNotifier};
    pub use crate::config::{Config, Credentials};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
}
