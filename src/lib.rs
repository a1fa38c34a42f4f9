//! # Waitlist
//!
//! Restaurant waitlist core, as seen by the screen that renders it.
//!
//! The presentation layer owns rendering and gestures. It calls in here to:
//! - add a guest from the form (`add_from_form`)
//! - fetch the ordered list with urgency for each row (`guests`)
//! - remove a swiped guest (`remove_guest`)
//! - report the first fully visible row after a scroll (`on_scrolled`)
//!
//! Everything runs synchronously on the caller's thread.

use chrono::Utc;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use waitlist_core::{
    GuestRecord, NewGuest, Result, Urgency, UrgencyPolicy, WaitlistConfig, WaitlistError,
};
pub use waitlist_db::WaitlistDb;
pub use waitlist_notify::{NotifyOutcome, SecondPositionNotifier, SmsSender, TwilioSender};

/// One rendered row: the stored guest plus how urgently they need seating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestRow {
    #[serde(flatten)]
    pub guest: GuestRecord,
    pub urgency: Urgency,
}

/// Store, urgency policy and notifier wired together.
pub struct WaitlistService {
    db: WaitlistDb,
    policy: UrgencyPolicy,
    notifier: SecondPositionNotifier,
}

impl WaitlistService {
    /// Open the configured database and set up notifications.
    pub fn open(config: &WaitlistConfig) -> Result<Self> {
        config.validate()?;
        let db = WaitlistDb::open(&config.database.resolved_path())?;
        let notifier = SecondPositionNotifier::from_config(&config.sms)?;
        Ok(Self::with_parts(
            db,
            UrgencyPolicy::from_config(&config.urgency),
            notifier,
        ))
    }

    pub fn with_parts(
        db: WaitlistDb,
        policy: UrgencyPolicy,
        notifier: SecondPositionNotifier,
    ) -> Self {
        Self { db, policy, notifier }
    }

    pub fn db(&self) -> &WaitlistDb {
        &self.db
    }

    pub fn policy(&self) -> UrgencyPolicy {
        self.policy
    }

    /// Add a guest from raw form text, booked now.
    /// `None` when name or party size is missing; nothing is stored then.
    pub fn add_from_form(
        &self,
        name: &str,
        party_size: &str,
        mobile_number: &str,
    ) -> Result<Option<i64>> {
        let guest = match NewGuest::from_form(name, party_size, mobile_number) {
            Ok(guest) => guest,
            Err(WaitlistError::InvalidRecord(reason)) => {
                tracing::debug!("Ignoring incomplete add-guest form: {reason}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.db.add_guest_now(&guest).map(Some)
    }

    pub fn add_guest(
        &self,
        name: &str,
        party_size: u32,
        mobile_number: Option<&str>,
        booked_at: i64,
    ) -> Result<i64> {
        self.db.add_guest(name, party_size, mobile_number, booked_at)
    }

    /// Ordered snapshot for rendering, urgency as of now.
    pub fn guests(&self) -> Result<Vec<GuestRow>> {
        self.guests_at(Utc::now().timestamp_millis())
    }

    /// Ordered snapshot for rendering, urgency as of `now` (epoch millis).
    pub fn guests_at(&self, now: i64) -> Result<Vec<GuestRow>> {
        Ok(self
            .db
            .list_guests()?
            .into_iter()
            .map(|guest| GuestRow {
                urgency: self.policy.classify(guest.booked_at, now),
                guest,
            })
            .collect())
    }

    /// Swipe-to-remove. `false` if the guest was already gone.
    pub fn remove_guest(&mut self, id: i64) -> Result<bool> {
        let removed = self.db.remove_guest(id)?;
        self.notifier.forget(id);
        Ok(removed)
    }

    /// Scroll report: `first_visible` is the zero-based position of the first
    /// fully visible row. Storage errors propagate; send failures do not.
    pub fn on_scrolled(&mut self, first_visible: usize) -> Result<NotifyOutcome> {
        if first_visible != waitlist_notify::SECOND_POSITION {
            return Ok(NotifyOutcome::NotTriggered);
        }
        let guests = self.db.list_guests()?;
        Ok(self.notifier.on_first_visible(first_visible, &guests))
    }
}

/// Install a fmt subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "waitlist=debug,waitlist_core=debug,waitlist_db=debug,waitlist_notify=debug"
    } else {
        "waitlist=info,waitlist_core=info,waitlist_db=info,waitlist_notify=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .try_init();
}
