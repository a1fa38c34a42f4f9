//! # Waitlist Notify
//!
//! Texts the party that has reached second place in line.
//!
//! ```text
//! scroll report (first visible = 1)
//!   └── SecondPositionNotifier
//!         ├── guest at slot 1 → own mobile number
//!         ├── one-shot flag per guest
//!         └── SmsSender (TwilioSender) → failures logged, dropped
//! ```

pub mod sms;
pub mod trigger;

pub use sms::{SmsSender, TwilioSender};
pub use trigger::{NotifyOutcome, SECOND_POSITION, SecondPositionNotifier};
