//! Guest records and add-guest input.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaitlistError};

/// One waiting party, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    /// Assigned by the store on insert; never reused.
    pub id: i64,
    pub name: String,
    pub party_size: u32,
    pub mobile_number: Option<String>,
    /// Epoch milliseconds at insert time.
    pub booked_at: i64,
}

impl GuestRecord {
    /// Mobile number, if one was given and is not blank.
    pub fn recipient(&self) -> Option<&str> {
        self.mobile_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Validated input for a new guest, built from the add-guest form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuest {
    pub name: String,
    pub party_size: u32,
    pub mobile_number: Option<String>,
}

impl NewGuest {
    /// Build from raw form text.
    ///
    /// Name and party size are required. A party size that is not a positive
    /// integer falls back to 1. A blank mobile number becomes `None`.
    pub fn from_form(name: &str, party_size: &str, mobile_number: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WaitlistError::InvalidRecord("guest name is required".into()));
        }
        let party_size = party_size.trim();
        if party_size.is_empty() {
            return Err(WaitlistError::InvalidRecord("party size is required".into()));
        }
        let party_size = match party_size.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            Ok(n) => {
                tracing::warn!("Party size {n} is not positive, using 1");
                1
            }
            Err(e) => {
                tracing::warn!("Failed to parse party size '{party_size}': {e}, using 1");
                1
            }
        };
        let mobile_number = Some(mobile_number.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            party_size,
            mobile_number,
        })
    }
}
