//! # Waitlist Core
//!
//! Shared building blocks for the waitlist workspace:
//! - `config`: TOML configuration with defaults and env overrides
//! - `error`: the error taxonomy every crate returns
//! - `types`: guest records and validated add-guest input
//! - `urgency`: three-band waiting-time classification

pub mod config;
pub mod error;
pub mod types;
pub mod urgency;

pub use config::WaitlistConfig;
pub use error::{Result, WaitlistError};
pub use types::{GuestRecord, NewGuest};
pub use urgency::{Urgency, UrgencyPolicy};
