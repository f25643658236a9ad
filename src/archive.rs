//! Read-only access to the zip container of an IPA.

use crate::Result;
use log::debug;
use std::fmt::Debug;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// An opened IPA. The underlying reader is released when this is dropped.
#[derive(Debug)]
pub struct IpaArchive<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl<R: Read + Seek + Debug> IpaArchive<R> {
    /// Open `reader` as a zip container, failing if it is not one.
    pub fn new(reader: R) -> std::result::Result<Self, zip::result::ZipError> {
        let zip = ZipArchive::new(reader)?;
        debug!("Opened archive with {} entries", zip.len());
        Ok(Self { zip })
    }

    /// Entry names in central directory order.
    pub fn entry_names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.zip.len());
        for i in 0..self.zip.len() {
            names.push(self.zip.by_index_raw(i)?.name().to_owned());
        }
        Ok(names)
    }

    /// Read the full, decompressed content of `name`.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.zip.by_name(name)?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        debug!("Read {} ({} bytes)", name, content.len());
        Ok(content)
    }
}
