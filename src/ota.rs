//! Static files for over-the-air installation.
//!
//! For `demo.ipa` at version `1.2` served from `example.com`, the site lives
//! in `<base>/demo/1.2/` and is reachable at
//! `https://example.com/ipa/demo/1.2/`. It holds the install manifest
//! (`demo.plist`), a landing page (`index.html`) and `demo.ipa`.
//!
//! Templates are plain text; `{{APP_VERSION}}`, `{{APP_NAME}}` and
//! `{{APP_ID}}` are replaced in both, `{{IPA_URI}}` only in the manifest and
//! `{{PLIST_URI}}` only in the page. Values are inserted verbatim.

use crate::metadata::{AppMetadata, BUNDLE_IDENTIFIER, BUNDLE_VERSION, DISPLAY_NAME};
use crate::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const MANIFEST_TEMPLATE_FILE: &str = "template.plist";
pub const PAGE_TEMPLATE_FILE: &str = "template.html";

/// Manifest and landing page templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub manifest: String,
    pub page: String,
}

impl Templates {
    /// Templates compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            manifest: include_str!("../templates/template.plist").to_owned(),
            page: include_str!("../templates/template.html").to_owned(),
        }
    }

    /// Load `template.plist` and `template.html` from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            manifest: fs::read_to_string(dir.join(MANIFEST_TEMPLATE_FILE))?,
            page: fs::read_to_string(dir.join(PAGE_TEMPLATE_FILE))?,
        })
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Paths of the files written by [`OtaSite::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSite {
    pub dir: PathBuf,
    pub ipa: PathBuf,
    pub manifest: PathBuf,
    pub page: PathBuf,
}

/// Everything needed to lay out one app version on the web server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaSite {
    ipa_name: String,
    server_host: String,
    app_version: String,
    app_name: String,
    app_id: String,
    out_dir: PathBuf,
}

impl OtaSite {
    /// Fails with [`Error::MissingField`] when the version, display name or
    /// identifier is absent, and with [`Error::InvalidManifest`] when the
    /// version is not usable as a single directory name.
    pub fn new(
        ipa_path: &Path,
        server_host: &str,
        base_dir: &Path,
        metadata: &AppMetadata,
    ) -> Result<Self> {
        let app_version = metadata
            .bundle_version()
            .ok_or(Error::MissingField(BUNDLE_VERSION))?;
        let app_name = metadata
            .display_name()
            .ok_or(Error::MissingField(DISPLAY_NAME))?;
        let app_id = metadata
            .bundle_identifier()
            .ok_or(Error::MissingField(BUNDLE_IDENTIFIER))?;
        check_path_segment(app_version)?;

        let ipa_name = ipa_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_dir = base_dir.join(&ipa_name).join(app_version);

        Ok(Self {
            ipa_name,
            server_host: server_host.to_owned(),
            app_version: app_version.to_owned(),
            app_name: app_name.to_owned(),
            app_id: app_id.to_owned(),
            out_dir,
        })
    }

    pub fn ipa_name(&self) -> &str {
        &self.ipa_name
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// `https://<host>/ipa/<name>/<version>/`
    pub fn base_uri(&self) -> String {
        format!(
            "https://{}/ipa/{}/{}/",
            self.server_host, self.ipa_name, self.app_version
        )
    }

    pub fn ipa_uri(&self) -> String {
        format!("{}{}.ipa", self.base_uri(), self.ipa_name)
    }

    pub fn manifest_uri(&self) -> String {
        format!("{}{}.plist", self.base_uri(), self.ipa_name)
    }

    fn common_tokens(&self) -> [(&'static str, &str); 3] {
        [
            ("{{APP_VERSION}}", self.app_version.as_str()),
            ("{{APP_NAME}}", self.app_name.as_str()),
            ("{{APP_ID}}", self.app_id.as_str()),
        ]
    }

    pub fn render_manifest(&self, template: &str) -> String {
        let ipa_uri = self.ipa_uri();
        let rendered = substitute(template, &self.common_tokens());
        substitute(&rendered, &[("{{IPA_URI}}", ipa_uri.as_str())])
    }

    pub fn render_page(&self, template: &str) -> String {
        let manifest_uri = self.manifest_uri();
        let rendered = substitute(template, &self.common_tokens());
        substitute(&rendered, &[("{{PLIST_URI}}", manifest_uri.as_str())])
    }

    /// Create the output directory and write the three site files.
    ///
    /// The `.ipa` file receives the unrendered manifest template, not the
    /// archive itself.
    pub fn write(&self, templates: &Templates) -> Result<WrittenSite> {
        let written = WrittenSite {
            dir: self.out_dir.clone(),
            ipa: self.out_dir.join(format!("{}.ipa", self.ipa_name)),
            manifest: self.out_dir.join(format!("{}.plist", self.ipa_name)),
            page: self.out_dir.join("index.html"),
        };

        let manifest = self.render_manifest(&templates.manifest);
        let page = self.render_page(&templates.page);

        fs::create_dir_all(&written.dir)?;
        // TODO: copy the source archive here once the product owner confirms
        // the template copy is unintended.
        fs::write(&written.ipa, &templates.manifest)?;
        fs::write(&written.manifest, manifest)?;
        fs::write(&written.page, page)?;
        debug!("Wrote site files to {}", written.dir.display());

        Ok(written)
    }
}

/// The version becomes a directory under the archive's directory, so it
/// must be exactly one plain path component.
fn check_path_segment(app_version: &str) -> Result<()> {
    let mut components = Path::new(app_version).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == app_version => Ok(()),
        _ => Err(Error::InvalidManifest {
            entry: "Info.plist".to_owned(),
            reason: format!("{} {:?} is not a plain directory name", BUNDLE_VERSION, app_version),
        }),
    }
}

/// Replace each token with its value, verbatim.
pub fn substitute(template: &str, tokens: &[(&str, &str)]) -> String {
    tokens
        .iter()
        .fold(template.to_owned(), |text, (token, value)| {
            text.replace(token, value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::{Dictionary, Value};
    use rstest::rstest;
    use tempfile::TempDir;

    fn metadata(pairs: &[(&str, &str)]) -> AppMetadata {
        let mut info = Dictionary::new();
        for (k, v) in pairs {
            info.insert((*k).to_owned(), Value::String((*v).to_owned()));
        }
        AppMetadata::project(&info)
    }

    fn demo_site(base: &Path) -> OtaSite {
        let metadata = metadata(&[
            (BUNDLE_IDENTIFIER, "com.x.demo"),
            (BUNDLE_VERSION, "1.2"),
            (DISPLAY_NAME, "Demo"),
        ]);
        OtaSite::new(Path::new("builds/demo.ipa"), "example.com", base, &metadata).unwrap()
    }

    #[test]
    fn builds_uris_from_archive_stem_and_version() {
        let site = demo_site(Path::new("/out"));

        assert_eq!(site.ipa_name(), "demo");
        assert_eq!(site.out_dir(), Path::new("/out/demo/1.2"));
        assert_eq!(site.base_uri(), "https://example.com/ipa/demo/1.2/");
        assert_eq!(site.ipa_uri(), "https://example.com/ipa/demo/1.2/demo.ipa");
        assert_eq!(
            site.manifest_uri(),
            "https://example.com/ipa/demo/1.2/demo.plist"
        );
    }

    #[test]
    fn manifest_gets_ipa_uri_but_not_plist_uri() {
        let site = demo_site(Path::new("/out"));
        let rendered =
            site.render_manifest("{{APP_ID}} {{APP_NAME}} {{APP_VERSION}} {{IPA_URI}} {{PLIST_URI}}");

        assert_eq!(
            rendered,
            "com.x.demo Demo 1.2 https://example.com/ipa/demo/1.2/demo.ipa {{PLIST_URI}}"
        );
    }

    #[test]
    fn page_gets_plist_uri_but_not_ipa_uri() {
        let site = demo_site(Path::new("/out"));
        let rendered =
            site.render_page("{{APP_ID}} {{APP_NAME}} {{APP_VERSION}} {{IPA_URI}} {{PLIST_URI}}");

        assert_eq!(
            rendered,
            "com.x.demo Demo 1.2 {{IPA_URI}} https://example.com/ipa/demo/1.2/demo.plist"
        );
    }

    #[test]
    fn substitutes_every_occurrence_without_escaping() {
        assert_eq!(
            substitute("{{A}}<{{A}}>", &[("{{A}}", "x&y")]),
            "x&y<x&y>"
        );
    }

    #[test]
    fn missing_required_field_is_reported() {
        let metadata = metadata(&[(BUNDLE_IDENTIFIER, "com.x.demo"), (BUNDLE_VERSION, "1.2")]);

        let err = OtaSite::new(Path::new("demo.ipa"), "example.com", Path::new("/out"), &metadata)
            .unwrap_err();

        assert!(matches!(err, Error::MissingField(DISPLAY_NAME)));
    }

    #[rstest]
    #[case::absolute("/tmp/elsewhere")]
    #[case::parent("..")]
    #[case::climbs_out("../../etc")]
    #[case::nested("1.2/beta")]
    #[case::trailing_slash("1.2/")]
    #[case::current(".")]
    #[case::empty("")]
    fn version_must_be_a_single_directory_name(#[case] version: &str) {
        let base = TempDir::new().unwrap();
        let metadata = metadata(&[
            (BUNDLE_IDENTIFIER, "com.x.demo"),
            (BUNDLE_VERSION, version),
            (DISPLAY_NAME, "Demo"),
        ]);

        let err = OtaSite::new(Path::new("demo.ipa"), "example.com", base.path(), &metadata)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidManifest { .. }), "got {:?}", err);
        assert!(fs::read_dir(base.path()).unwrap().next().is_none());
    }

    #[rstest]
    #[case("1.2")]
    #[case("2024.10.19-rc1")]
    #[case("1.0 (42)")]
    fn accepts_ordinary_versions(#[case] version: &str) {
        let metadata = metadata(&[
            (BUNDLE_IDENTIFIER, "com.x.demo"),
            (BUNDLE_VERSION, version),
            (DISPLAY_NAME, "Demo"),
        ]);

        let site = OtaSite::new(Path::new("demo.ipa"), "example.com", Path::new("/out"), &metadata)
            .unwrap();

        assert_eq!(site.out_dir(), Path::new("/out/demo").join(version));
    }

    #[test]
    fn builtin_templates_carry_their_tokens() {
        let templates = Templates::builtin();
        assert!(templates.manifest.contains("{{IPA_URI}}"));
        assert!(templates.page.contains("{{PLIST_URI}}"));
        for token in ["{{APP_VERSION}}", "{{APP_NAME}}", "{{APP_ID}}"] {
            assert!(templates.manifest.contains(token));
            assert!(templates.page.contains(token));
        }
    }

    #[test]
    fn rendered_builtin_manifest_is_a_valid_plist() {
        let site = demo_site(Path::new("/out"));
        let rendered = site.render_manifest(&Templates::builtin().manifest);

        let value = Value::from_reader_xml(rendered.as_bytes()).unwrap();
        let items = value
            .as_dictionary()
            .and_then(|d| d.get("items"))
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn loads_templates_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_TEMPLATE_FILE), "m {{IPA_URI}}").unwrap();
        fs::write(dir.path().join(PAGE_TEMPLATE_FILE), "p {{PLIST_URI}}").unwrap();

        let templates = Templates::from_dir(dir.path()).unwrap();

        assert_eq!(templates.manifest, "m {{IPA_URI}}");
        assert_eq!(templates.page, "p {{PLIST_URI}}");
    }

    #[test]
    fn missing_template_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Templates::from_dir(dir.path().join("nope")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn writes_three_files_under_name_and_version() {
        let base = TempDir::new().unwrap();
        let site = demo_site(base.path());
        let templates = Templates {
            manifest: "manifest {{IPA_URI}} {{APP_ID}}".to_owned(),
            page: "page {{PLIST_URI}}".to_owned(),
        };

        let written = site.write(&templates).unwrap();

        assert_eq!(written.dir, base.path().join("demo").join("1.2"));
        assert_eq!(
            fs::read_to_string(&written.manifest).unwrap(),
            "manifest https://example.com/ipa/demo/1.2/demo.ipa com.x.demo"
        );
        assert_eq!(
            fs::read_to_string(&written.page).unwrap(),
            "page https://example.com/ipa/demo/1.2/demo.plist"
        );
        assert_eq!(written.page.file_name().unwrap(), "index.html");
    }

    #[test]
    fn ipa_output_holds_manifest_template_not_archive() {
        // Known discrepancy: the .ipa file is filled from the raw manifest
        // template rather than copied from the source archive.
        let base = TempDir::new().unwrap();
        let site = demo_site(base.path());
        let templates = Templates {
            manifest: "raw {{IPA_URI}}".to_owned(),
            page: String::new(),
        };

        let written = site.write(&templates).unwrap();

        assert_eq!(written.ipa.file_name().unwrap(), "demo.ipa");
        assert_eq!(fs::read_to_string(&written.ipa).unwrap(), "raw {{IPA_URI}}");
    }
}
