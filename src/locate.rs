//! Finding manifest entries by name inside an IPA listing.

use regex::Regex;
use std::sync::LazyLock;

static APP_MANIFEST_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Payload/.+?\.app/Info\.plist$").expect("valid regex"));
static STORE_METADATA_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^iTunesMetadata\.plist$").expect("valid regex"));

/// The two manifests an IPA may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// `Payload/<Name>.app/Info.plist`, the bundle's own manifest.
    Application,
    /// `iTunesMetadata.plist` at the archive root, written by the store.
    StoreMetadata,
}

impl ManifestKind {
    /// Name used in error messages, e.g. "Info" in "Info.plist file not found".
    pub fn label(self) -> &'static str {
        match self {
            ManifestKind::Application => "Info",
            ManifestKind::StoreMetadata => "iTunesMetadata",
        }
    }

    pub fn matches(self, entry_name: &str) -> bool {
        match self {
            ManifestKind::Application => APP_MANIFEST_RX.is_match(entry_name),
            ManifestKind::StoreMetadata => STORE_METADATA_RX.is_match(entry_name),
        }
    }
}

/// Return the first entry name, in listing order, matching `kind`.
pub fn locate<S: AsRef<str>>(entry_names: &[S], kind: ManifestKind) -> Option<&str> {
    entry_names
        .iter()
        .map(AsRef::as_ref)
        .find(|name| kind.matches(name))
}
