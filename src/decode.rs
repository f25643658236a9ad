//! Decoding manifest bytes into a dictionary.
//!
//! Manifests inside an IPA come either as XML or as binary property lists.
//! [`sniff`] decides which from the first bytes; [`ManifestDecoder`] routes
//! XML straight to [`XmlDecoder`] and everything else through a
//! [`ConvertingDecoder`], which asks a [`PlistConverter`] for an XML copy
//! in a scratch directory first.

use crate::convert::PlistConverter;
use crate::{Error, Result};
use log::{debug, warn};
use plist::{Dictionary, Value};
use regex::bytes::Regex;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;
use tempfile::TempDir;

static XML_DECLARATION_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\??xml").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Xml,
    Binary,
}

/// Classify manifest bytes by their leading XML declaration.
pub fn sniff(content: &[u8]) -> Encoding {
    if XML_DECLARATION_RX.is_match(content) {
        Encoding::Xml
    } else {
        Encoding::Binary
    }
}

/// One way of turning raw manifest bytes into a dictionary.
pub trait Decode {
    fn decode(&self, entry_name: &str, content: &[u8]) -> Result<Dictionary>;
}

/// Decodes XML property lists directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl XmlDecoder {
    fn decode_reader<R: Read>(entry_name: &str, reader: R) -> Result<Dictionary> {
        match Value::from_reader_xml(reader)? {
            Value::Dictionary(dict) => Ok(dict),
            _ => Err(Error::InvalidManifest {
                entry: entry_name.to_owned(),
                reason: "top level is not a dictionary".to_owned(),
            }),
        }
    }
}

impl Decode for XmlDecoder {
    fn decode(&self, entry_name: &str, content: &[u8]) -> Result<Dictionary> {
        Self::decode_reader(entry_name, Cursor::new(content))
    }
}

/// Converts to XML through a [`PlistConverter`] before decoding.
///
/// The bytes are handed to the converter under the entry's base file name
/// inside a fresh temporary directory, which is removed afterwards whatever
/// the outcome.
#[derive(Debug, Clone, Default)]
pub struct ConvertingDecoder<C> {
    converter: C,
}

impl<C: PlistConverter> ConvertingDecoder<C> {
    pub fn new(converter: C) -> Self {
        Self { converter }
    }
}

impl<C: PlistConverter> Decode for ConvertingDecoder<C> {
    fn decode(&self, entry_name: &str, content: &[u8]) -> Result<Dictionary> {
        let temp_dir = TempDir::new()?;
        let file_name = Path::new(entry_name)
            .file_name()
            .unwrap_or_else(|| OsStr::new("Info.plist"));
        let target = temp_dir.path().join(file_name);

        let result = self
            .converter
            .convert(content, &target)
            .and_then(|()| {
                let file = File::open(&target).map_err(|e| {
                    Error::ConverterFailed(format!("no output at {}: {}", target.display(), e))
                })?;
                XmlDecoder::decode_reader(entry_name, BufReader::new(file))
            });

        let temp_path = temp_dir.path().to_path_buf();
        if let Err(e) = temp_dir.close() {
            warn!(
                "Failed to remove temporary directory {}: {}",
                temp_path.display(),
                e
            );
        }
        result
    }
}

/// Picks the decoder for a manifest by sniffing its content.
#[derive(Debug, Clone, Default)]
pub struct ManifestDecoder<C> {
    xml: XmlDecoder,
    binary: ConvertingDecoder<C>,
}

impl<C: PlistConverter> ManifestDecoder<C> {
    pub fn new(converter: C) -> Self {
        Self {
            xml: XmlDecoder,
            binary: ConvertingDecoder::new(converter),
        }
    }

    /// The decoder that handles `encoding`.
    pub fn decoder_for(&self, encoding: Encoding) -> &dyn Decode {
        match encoding {
            Encoding::Xml => &self.xml,
            Encoding::Binary => &self.binary,
        }
    }
}

impl<C: PlistConverter> Decode for ManifestDecoder<C> {
    fn decode(&self, entry_name: &str, content: &[u8]) -> Result<Dictionary> {
        let encoding = sniff(content);
        debug!("{} looks like {:?}", entry_name, encoding);
        self.decoder_for(encoding).decode(entry_name, content)
    }
}
