/// Backend-assigned run identifiers are opaque strings (the engine hands
/// out a fresh one when a staged run is started).
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
