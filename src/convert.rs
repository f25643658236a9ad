//! Binary to XML property list conversion.

use crate::decode::{sniff, Encoding};
use crate::{Error, Result};
use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Turns a binary property list into an XML one on disk.
///
/// On success `target` holds an XML property list. Implementations may use
/// `target` as scratch space along the way.
pub trait PlistConverter {
    fn convert(&self, bytes: &[u8], target: &Path) -> Result<()>;
}

/// Which `plistutil` command line to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    Linux,
    OtherUnix,
}

impl HostFamily {
    /// Classify a reported system name such as `linux` or `macos`.
    pub fn from_system_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("linux") {
            HostFamily::Linux
        } else {
            HostFamily::OtherUnix
        }
    }

    pub fn current() -> Self {
        Self::from_system_name(std::env::consts::OS)
    }

    /// Arguments that convert `path` to XML in place.
    pub fn plistutil_args(self, path: &Path) -> Vec<&OsStr> {
        let path = path.as_os_str();
        match self {
            HostFamily::Linux => vec![OsStr::new("-i"), path, OsStr::new("-o"), path],
            HostFamily::OtherUnix => vec![OsStr::new("-convert"), OsStr::new("xml1"), path],
        }
    }
}

/// Runs the external `plistutil` tool (libplist-utils) in place on `target`.
#[derive(Debug, Clone)]
pub struct PlistUtil {
    host: HostFamily,
    program: Option<PathBuf>,
}

impl PlistUtil {
    pub fn new() -> Self {
        Self::for_host(HostFamily::current())
    }

    pub fn for_host(host: HostFamily) -> Self {
        Self {
            host,
            program: None,
        }
    }

    /// Run `program` instead of looking `plistutil` up on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    fn program(&self) -> Result<PathBuf> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => which::which("plistutil").map_err(|e| {
                Error::ConverterFailed(format!("plistutil not found on PATH: {}", e))
            }),
        }
    }
}

impl Default for PlistUtil {
    fn default() -> Self {
        Self::new()
    }
}

impl PlistConverter for PlistUtil {
    fn convert(&self, bytes: &[u8], target: &Path) -> Result<()> {
        let program = self.program()?;
        fs::write(target, bytes)?;

        let args = self.host.plistutil_args(target);
        debug!("Running {} {:?}", program.display(), args);

        let output = Command::new(&program).args(&args).output().map_err(|e| {
            Error::ConverterFailed(format!("failed to run {}: {}", program.display(), e))
        })?;
        if !output.status.success() {
            return Err(Error::ConverterFailed(format!(
                "plistutil exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // The input was written to `target`, so only its content tells
        // whether anything was converted.
        let converted = fs::read(target).map_err(|e| {
            Error::ConverterFailed(format!("no output at {}: {}", target.display(), e))
        })?;
        if sniff(&converted) != Encoding::Xml {
            return Err(Error::ConverterFailed(format!(
                "plistutil left {} unconverted",
                target.display()
            )));
        }
        Ok(())
    }
}

/// Re-encodes with the `plist` crate, no external tool needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl PlistConverter for NativeConverter {
    fn convert(&self, bytes: &[u8], target: &Path) -> Result<()> {
        let value = plist::Value::from_reader(Cursor::new(bytes))?;
        value.to_file_xml(target)?;
        Ok(())
    }
}
