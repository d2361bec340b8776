//! File storage

pub mod archive;

pub use archive::{sanitize_filename, UploadArchive};
