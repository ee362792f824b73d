pub mod duration;
pub mod ingestion_service;
pub mod ledger_service;
pub mod report_service;

pub use ingestion_service::IngestionService;
pub use ledger_service::LedgerService;
pub use report_service::ReportService;
