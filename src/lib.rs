pub mod archive;
pub mod convert;
pub mod decode;
pub mod error;
pub mod extract;
pub mod locate;
pub mod metadata;
pub mod ota;

pub use archive::IpaArchive;
pub use convert::{NativeConverter, PlistConverter, PlistUtil};
pub use error::Error;
pub use extract::{Extraction, ManifestExtractor};
pub use locate::{locate, ManifestKind};
pub use metadata::{AppMetadata, StoreMetadata};
pub use ota::{OtaSite, Templates};

use log::{debug, error};
use plist::Dictionary;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Reads application metadata out of one IPA.
///
/// Locating and extracting record their problems instead of failing fast;
/// the run is only declared failed at the end, with every recorded problem
/// in [`Error::ExtractionFailed`].
pub struct IpaInspector<R: Read + Seek + Sized + Debug, C: PlistConverter> {
    reader: R,
    source: PathBuf,
    extractor: ManifestExtractor<C>,
}

impl<C: PlistConverter> IpaInspector<BufReader<File>, C> {
    /// Inspect the IPA at `path`.
    pub fn open(path: impl AsRef<Path>, converter: C) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening IPA file: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path, converter))
    }
}

impl<R: Read + Seek + Sized + Debug, C: PlistConverter> IpaInspector<R, C> {
    /// `source` names the archive in error messages.
    pub fn new(reader: R, source: impl Into<PathBuf>, converter: C) -> Self {
        Self {
            reader,
            source: source.into(),
            extractor: ManifestExtractor::new(converter),
        }
    }

    /// Extract and project `Payload/<Name>.app/Info.plist`.
    pub fn app_metadata(self) -> Result<AppMetadata> {
        let info = self.extract_checked(ManifestKind::Application)?;
        Ok(AppMetadata::project(&info))
    }

    /// Extract and project `iTunesMetadata.plist`.
    pub fn store_metadata(self) -> Result<StoreMetadata> {
        let metadata = self.extract_checked(ManifestKind::StoreMetadata)?;
        Ok(StoreMetadata::project(&metadata))
    }

    fn extract_checked(self, kind: ManifestKind) -> Result<Dictionary> {
        let extraction = match IpaArchive::new(self.reader) {
            Ok(mut archive) => self.extractor.extract(&mut archive, kind)?,
            Err(source) => Extraction {
                metadata: Dictionary::new(),
                errors: vec![Error::NotAnArchive {
                    path: self.source,
                    source,
                }],
            },
        };

        if extraction.is_clean() {
            return Ok(extraction.metadata);
        }
        for e in &extraction.errors {
            error!("{}", e);
        }
        Err(Error::ExtractionFailed(extraction.errors))
    }
}
