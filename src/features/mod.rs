pub mod institutions;
pub mod reports;
pub mod statuses;
