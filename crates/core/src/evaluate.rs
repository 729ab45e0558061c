use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::date::ExpiryDate;

/// Whether a product is past its expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryVerdict {
    #[serde(rename = "isExpired")]
    pub is_expired: bool,
}

pub struct ExpiryEvaluator;

impl ExpiryEvaluator {
    /// Checks against the local wall clock. `None` is "unknown" and reports `false`;
    /// callers must surface a missing date themselves.
    pub fn is_expired(expiry: Option<ExpiryDate>) -> bool {
        Self::is_expired_at(expiry, Local::now().naive_local())
    }

    /// Expired once `now` is past the last instant of the expiry day.
    pub fn is_expired_at(expiry: Option<ExpiryDate>, now: NaiveDateTime) -> bool {
        let Some(expiry) = expiry else {
            tracing::warn!("Expiry date is missing; cannot compare");
            return false;
        };
        // Strictly after the end of the day is the same as being on a later day.
        now.date() > expiry.date()
    }

    pub fn verdict(expiry: ExpiryDate) -> ExpiryVerdict {
        ExpiryVerdict { is_expired: Self::is_expired(Some(expiry)) }
    }
}
