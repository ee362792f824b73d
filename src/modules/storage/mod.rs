pub mod relocator;
pub mod stager;

pub use relocator::MediaRelocator;
pub use stager::{StagedUpload, UploadStager};
