//! The subset of manifest fields the OTA site needs.

use log::debug;
use plist::{Dictionary, Value};

pub const BUNDLE_IDENTIFIER: &str = "CFBundleIdentifier";
pub const BUNDLE_VERSION: &str = "CFBundleVersion";
pub const SHORT_VERSION: &str = "CFBundleShortVersionString";
pub const EXECUTABLE: &str = "CFBundleExecutable";
pub const DISPLAY_NAME: &str = "CFBundleDisplayName";
pub const PLATFORM_VERSION: &str = "DTPlatformVersion";
pub const MINIMUM_OS_VERSION: &str = "MinimumOSVersion";
pub const DEVICE_FAMILY: &str = "UIDeviceFamily";
pub const REQUIRED_CAPABILITIES: &str = "UIRequiredDeviceCapabilities";

/// Keys copied verbatim from Info.plist when present.
pub const PROJECTED_KEYS: [&str; 9] = [
    BUNDLE_IDENTIFIER,
    BUNDLE_VERSION,
    SHORT_VERSION,
    EXECUTABLE,
    DISPLAY_NAME,
    PLATFORM_VERSION,
    MINIMUM_OS_VERSION,
    DEVICE_FAMILY,
    REQUIRED_CAPABILITIES,
];

const URL_TYPES: &str = "CFBundleURLTypes";
const URL_SCHEMES: &str = "CFBundleURLSchemes";

/// Application metadata projected from Info.plist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppMetadata {
    /// The [`PROJECTED_KEYS`] that were present, with their original values.
    pub fields: Dictionary,
    /// Every URL scheme of every URL type, in order, duplicates kept.
    pub url_schemes: Vec<String>,
}

impl AppMetadata {
    pub fn project(info: &Dictionary) -> Self {
        let fields = PROJECTED_KEYS
            .iter()
            .filter_map(|&key| info.get(key).map(|v| (key.to_owned(), v.clone())))
            .collect();

        let url_schemes = info
            .get(URL_TYPES)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_dictionary)
            .filter_map(|url_type| url_type.get(URL_SCHEMES).and_then(Value::as_array))
            .flatten()
            .filter_map(|scheme| match scheme.as_string() {
                Some(s) => Some(s.to_owned()),
                None => {
                    debug!("Ignoring non-string URL scheme {:?}", scheme);
                    None
                }
            })
            .collect();

        Self {
            fields,
            url_schemes,
        }
    }

    /// A projected field as a string, if present and a string.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_string)
    }

    pub fn bundle_identifier(&self) -> Option<&str> {
        self.string(BUNDLE_IDENTIFIER)
    }

    pub fn bundle_version(&self) -> Option<&str> {
        self.string(BUNDLE_VERSION)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.string(DISPLAY_NAME)
    }

    /// The projection as a single dictionary, `url_schemes` included.
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = self.fields.clone();
        dict.insert(
            "url_schemes".to_owned(),
            Value::Array(
                self.url_schemes
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        dict
    }
}

/// Store fields from iTunesMetadata.plist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMetadata {
    pub item_id: Option<u64>,
    pub item_name: Option<String>,
}

impl StoreMetadata {
    pub fn project(metadata: &Dictionary) -> Self {
        Self {
            item_id: metadata
                .get("itemId")
                .and_then(Value::as_unsigned_integer),
            item_name: metadata
                .get("itemName")
                .and_then(Value::as_string)
                .map(str::to_owned),
        }
    }
}
