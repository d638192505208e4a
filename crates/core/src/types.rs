use chrono::{DateTime, Utc};

/// UTC timestamp used across all crates.
pub type Timestamp = DateTime<Utc>;
