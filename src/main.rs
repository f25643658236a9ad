// src/main.rs
use env_logger::Env;
use ipa_ota::{IpaInspector, NativeConverter, OtaSite, PlistConverter, PlistUtil, Templates};
use log::{error, info};
use std::{path::PathBuf, process, str::FromStr};
use structopt::StructOpt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConverterChoice {
    PlistUtil,
    Native,
}

impl FromStr for ConverterChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plistutil" => Ok(ConverterChoice::PlistUtil),
            "native" => Ok(ConverterChoice::Native),
            other => Err(format!("unknown converter: {}", other)),
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "ipa-ota",
    about = "Generate an over-the-air install site for an iOS .ipa",
    after_help = "EXAMPLE:\n    ipa-ota app.ipa web.example.com /var/www/web"
)]
struct Opt {
    #[structopt(parse(from_os_str))]
    ipa_path: PathBuf,

    /// Host name the site is served from
    server_host: String,

    /// Files are written to <output-dir>/<ipa name>/<app version>/
    #[structopt(parse(from_os_str))]
    output_dir: PathBuf,

    /// Directory holding template.plist and template.html
    #[structopt(long, parse(from_os_str))]
    templates: Option<PathBuf>,

    /// How binary Info.plist files are converted to XML
    #[structopt(long, default_value = "plistutil", possible_values = &["plistutil", "native"])]
    converter: ConverterChoice,

    #[structopt(long)]
    debug: bool,
}

fn main() {
    // Initialize logger
    let env = Env::default().filter_or(
        "RUST_LOG",
        if std::env::args().any(|arg| arg == "--debug") {
            "debug"
        } else {
            "info"
        },
    );

    env_logger::init_from_env(env);

    // Parse command line arguments
    let opt = Opt::from_args();

    let result = match opt.converter {
        ConverterChoice::PlistUtil => run(&opt, PlistUtil::new()),
        ConverterChoice::Native => run(&opt, NativeConverter),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn run<C: PlistConverter>(opt: &Opt, converter: C) -> ipa_ota::Result<()> {
    let templates = match &opt.templates {
        Some(dir) => Templates::from_dir(dir)?,
        None => Templates::builtin(),
    };

    let metadata = IpaInspector::open(&opt.ipa_path, converter)?.app_metadata()?;
    let site = OtaSite::new(&opt.ipa_path, &opt.server_host, &opt.output_dir, &metadata)?;
    let written = site.write(&templates)?;

    info!("Processing {}", site.ipa_name());
    info!("APP_ID:      {}", metadata.bundle_identifier().unwrap_or_default());
    info!("APP_NAME:    {}", metadata.display_name().unwrap_or_default());
    info!("APP_VERSION: {}", metadata.bundle_version().unwrap_or_default());
    info!("Wrote files in {}", written.dir.display());
    info!("INSTALL URI: {}", site.base_uri());
    Ok(())
}
