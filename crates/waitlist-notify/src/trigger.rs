//! Second-position trigger: texts the party that is next after the one being seated.
//!
//! Fire-and-forget: the outcome is reported for logging and tests, but a failed
//! send never reaches the caller and is never retried. With `once_per_guest`
//! a guest is attempted at most once, however often they scroll into slot 1.

use std::collections::HashSet;
use waitlist_core::GuestRecord;
use waitlist_core::Result;
use waitlist_core::config::SmsConfig;

use crate::sms::{SmsSender, TwilioSender};

/// Ordinal (zero-based) of the guest who gets notified.
pub const SECOND_POSITION: usize = 1;

/// What happened to a notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Delivered to the provider; carries the provider message id.
    Sent(String),
    /// The provider call failed; logged and dropped.
    Failed(String),
    /// The reported position is not the second slot, or nobody is there.
    NotTriggered,
    /// The guest has no mobile number on record.
    NoRecipient,
    /// Already attempted for this guest.
    AlreadyNotified,
    /// SMS is switched off or not configured.
    Disabled,
}

pub struct SecondPositionNotifier {
    sender: Option<Box<dyn SmsSender>>,
    from_number: String,
    message: String,
    once_per_guest: bool,
    notified: HashSet<i64>,
}

impl SecondPositionNotifier {
    pub fn new(sender: Box<dyn SmsSender>, from_number: &str, message: &str) -> Self {
        Self {
            sender: Some(sender),
            from_number: from_number.to_string(),
            message: message.to_string(),
            once_per_guest: true,
            notified: HashSet::new(),
        }
    }

    /// A notifier that never sends.
    pub fn disabled() -> Self {
        let defaults = SmsConfig::default();
        Self {
            sender: None,
            from_number: String::new(),
            message: defaults.message,
            once_per_guest: true,
            notified: HashSet::new(),
        }
    }

    /// Build from config: Twilio when enabled and configured, otherwise disabled.
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        if !config.enabled {
            tracing::info!("SMS notifications disabled");
            return Ok(Self::disabled());
        }
        if !config.is_configured() {
            tracing::warn!("SMS enabled but Twilio credentials or source number missing, not sending");
            return Ok(Self::disabled());
        }
        let sender = TwilioSender::new(config)?;
        Ok(Self::new(Box::new(sender), &config.from_number, &config.message)
            .with_once_per_guest(config.once_per_guest))
    }

    pub fn with_once_per_guest(mut self, once: bool) -> Self {
        self.once_per_guest = once;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The presentation layer reports the first fully visible row.
    /// Only slot 1 triggers a send.
    pub fn on_first_visible(&mut self, position: usize, guests: &[GuestRecord]) -> NotifyOutcome {
        if position != SECOND_POSITION {
            return NotifyOutcome::NotTriggered;
        }
        match guests.get(SECOND_POSITION) {
            Some(guest) => self.notify_guest(guest),
            None => NotifyOutcome::NotTriggered,
        }
    }

    /// Text `guest` the fixed message at their own number.
    pub fn notify_guest(&mut self, guest: &GuestRecord) -> NotifyOutcome {
        let Some(sender) = self.sender.as_ref() else {
            tracing::debug!("SMS disabled, not notifying guest {}", guest.id);
            return NotifyOutcome::Disabled;
        };
        let Some(to) = guest.recipient() else {
            tracing::debug!("Guest {} has no mobile number, not notifying", guest.id);
            return NotifyOutcome::NoRecipient;
        };
        if self.once_per_guest && !self.notified.insert(guest.id) {
            return NotifyOutcome::AlreadyNotified;
        }

        match sender.send_sms(to, &self.from_number, &self.message) {
            Ok(sid) => {
                tracing::info!("Notified guest {} ({}) they are second in line", guest.id, guest.name);
                NotifyOutcome::Sent(sid)
            }
            Err(e) => {
                tracing::warn!("Unable to notify guest {}: {e}. Message not sent", guest.id);
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }

    /// Drop the one-shot flag for a guest that left the list.
    pub fn forget(&mut self, guest_id: i64) {
        self.notified.remove(&guest_id);
    }

    pub fn was_notified(&self, guest_id: i64) -> bool {
        self.notified.contains(&guest_id)
    }
}
