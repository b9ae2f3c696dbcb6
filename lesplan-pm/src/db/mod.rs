//! Per-table database query modules

pub mod enrollments;
pub mod lessons;
pub mod links;
pub mod notifications;
pub mod organizations;
pub mod preferences;
pub mod programs;
pub mod schedules;
pub mod term_periods;
