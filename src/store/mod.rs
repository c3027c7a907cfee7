//! File-backed collaborators: patient records and images.

pub mod images;
pub mod records;

pub use images::{FileImageStore, ImageArtifact, ImageStore};
pub use records::{FileRecordStore, RecordStore};
