pub mod report;
pub mod status_history;

pub use report::{NewReport, Report};
pub use status_history::StatusHistoryEntry;
