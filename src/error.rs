//! Error types for IPA inspection and OTA site generation.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for every fallible operation in this crate.
///
/// `NotAnArchive` and `ManifestNotFound` are not raised directly by
/// extraction: they are collected into an [`crate::extract::Extraction`] and
/// surface together as [`Error::ExtractionFailed`] once the validity gate
/// runs. Everything else aborts the run immediately.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input could not be opened as a zip container.
    #[error("not a valid zip archive [{}]: {source}", .path.display())]
    NotAnArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// No entry matched the requested manifest kind. Holds the kind label.
    #[error("{0}.plist file not found in IPA")]
    ManifestNotFound(&'static str),

    /// The binary-to-XML conversion step produced nothing usable.
    #[error("plist conversion failed: {0}")]
    ConverterFailed(String),

    #[error("Plist error: {0}")]
    Decode(#[from] plist::Error),

    /// The manifest decoded, but not into a dictionary.
    #[error("invalid manifest {entry}: {reason}")]
    InvalidManifest { entry: String, reason: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// One or more errors were recorded while locating and extracting.
    #[error("extraction failed: {}", join_messages(.0))]
    ExtractionFailed(Vec<Error>),

    /// A value required by the templates is absent from Info.plist.
    #[error("{0} missing from Info.plist")]
    MissingField(&'static str),
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
