pub mod institution;

pub use institution::Institution;
