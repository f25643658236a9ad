//! Pulling a decoded manifest out of an IPA.

use crate::archive::IpaArchive;
use crate::convert::PlistConverter;
use crate::decode::{Decode, ManifestDecoder};
use crate::locate::{locate, ManifestKind};
use crate::{Error, Result};
use log::debug;
use plist::Dictionary;
use std::fmt::Debug;
use std::io::{Read, Seek};

/// Outcome of extracting one manifest.
///
/// `errors` collects problems that void the result without stopping the
/// caller from running further extractions; `metadata` is empty whenever
/// `errors` is not.
#[derive(Debug, Default)]
pub struct Extraction {
    pub metadata: Dictionary,
    pub errors: Vec<Error>,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Locates and decodes manifests, one [`ManifestKind`] at a time.
#[derive(Debug, Clone, Default)]
pub struct ManifestExtractor<C> {
    decoder: ManifestDecoder<C>,
}

impl<C: PlistConverter> ManifestExtractor<C> {
    pub fn new(converter: C) -> Self {
        Self {
            decoder: ManifestDecoder::new(converter),
        }
    }

    /// Extract the manifest of `kind` from `archive`.
    ///
    /// A missing manifest is recorded in [`Extraction::errors`]. Read,
    /// conversion and decode failures are returned as `Err`.
    pub fn extract<R: Read + Seek + Debug>(
        &self,
        archive: &mut IpaArchive<R>,
        kind: ManifestKind,
    ) -> Result<Extraction> {
        let names = archive.entry_names()?;
        let Some(entry_name) = locate(&names, kind) else {
            return Ok(Extraction {
                metadata: Dictionary::new(),
                errors: vec![Error::ManifestNotFound(kind.label())],
            });
        };
        debug!("Found {}.plist at {}", kind.label(), entry_name);

        let content = archive.read_entry(entry_name)?;
        let metadata = self.decoder.decode(entry_name, &content)?;
        Ok(Extraction {
            metadata,
            errors: Vec::new(),
        })
    }
}
