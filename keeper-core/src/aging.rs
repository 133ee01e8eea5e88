use serde::{Deserialize, Serialize};
use std::fmt;

/// Age band for an open receivable or payable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "0-30 days")]
    Current,
    #[serde(rename = "31-60 days")]
    Days31To60,
    #[serde(rename = "61-90 days")]
    Days61To90,
    #[serde(rename = "90+ days")]
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 4] = [
        AgingBucket::Current,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// Bucket for the number of days elapsed since the due date.
    ///
    /// Anything up to 30 days, including items not yet due, is current.
    pub fn for_days(delta_days: i64) -> Self {
        match delta_days {
            ..=30 => AgingBucket::Current,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "0-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Over90 => "90+ days",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
