//! Domain types for accounts, meetings, and sync bookkeeping.

mod account;
mod meeting;
mod sync;

pub use account::{LinkedAccount, Provider};
pub use meeting::{Meeting, MeetingFields, NewMeeting, NormalizedMeeting};
pub use sync::{MeetingDiff, SyncPhase, SyncReport};
