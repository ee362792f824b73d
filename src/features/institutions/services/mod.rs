pub mod institution_service;

pub use institution_service::InstitutionService;
