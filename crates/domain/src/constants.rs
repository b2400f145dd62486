//! Fixed markers, defaults, and limits shared across the engine.

/// Substring (lowercased) that marks an event title as Linkcal-generated.
pub const LINKCAL_MARKER: &str = "linkcal";

/// Substring (lowercased) that marks an event title as a forwarded timeblock.
pub const TIMEBLOCK_MARKER: &str = "timeblock";

/// Fixed phrase embedded in the body of every forwarded placeholder event.
/// Matched case-insensitively when re-ingesting events.
pub const FORWARD_SIGNATURE: &str = "meeting forwarded by linkcal.io";

/// Title prefix for placeholder events created by the forwarder.
pub const TIMEBLOCK_TITLE_PREFIX: &str = "Linkcal Timeblock | ";

/// Defaults substituted for absent provider fields so downstream string
/// handling never sees missing values.
pub const NO_TITLE: &str = "No title";
pub const NO_LOCATION: &str = "No location";
pub const NO_LINK: &str = "No link";
pub const NO_DESCRIPTION: &str = "No description";

/// Fetch window bounds, relative to the moment of the fetch.
pub const WINDOW_MONTHS_BACK: u32 = 1;
pub const WINDOW_MONTHS_AHEAD: u32 = 3;

/// Per-meeting forward attempts before the meeting is recorded as failed.
pub const FORWARD_MAX_ATTEMPTS: u32 = 3;

/// Base delay for the forwarder's linear backoff, in milliseconds.
pub const FORWARD_BACKOFF_BASE_MS: u64 = 1000;

/// Minimum spacing between periodic all-account syncs.
pub const PERIODIC_SYNC_INTERVAL_HOURS: i64 = 12;
