//! Notification fan-out
//!
//! Audience resolution and channel-bucketed dispatch, consumed by the
//! effects worker off the request path.

pub mod audience;
pub mod dispatcher;
pub mod worker;

/// Preference scope accepting every program kind
pub const SCOPE_ALL: &str = "all";
/// Preference scope accepting only one-off programs
pub const SCOPE_WORKSHOPS_ONLY: &str = "workshops_only";

/// Notification categories, keyed per-user in preference records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    NewProgram,
    ProgramUpdated,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::NewProgram => "new_program",
            NotificationCategory::ProgramUpdated => "program_updated",
        }
    }
}
