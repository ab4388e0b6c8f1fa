use crate::error::{ParseError, ParseErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The coarse platform name used by manifests to scope dependencies,
/// build settings, and minimum deployment versions.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOS,
    IOS,
    TvOS,
    WatchOS,
    Linux,
    Android,
    Windows,
    Wasi,
    FreeBSD,
}

impl Platform {
    /// The canonical lowercase name, as it appears in manifest conditions.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::IOS => "ios",
            Platform::TvOS => "tvos",
            Platform::WatchOS => "watchos",
            Platform::Linux => "linux",
            Platform::Android => "android",
            Platform::Windows => "windows",
            Platform::Wasi => "wasi",
            Platform::FreeBSD => "freebsd",
        }
    }

    pub fn is_darwin(&self) -> bool {
        matches!(
            self,
            Platform::MacOS | Platform::IOS | Platform::TvOS | Platform::WatchOS
        )
    }
}

impl FromStr for Platform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Platform, ParseError> {
        match s.to_lowercase().as_str() {
            "macos" | "osx" => Ok(Platform::MacOS),
            "ios" => Ok(Platform::IOS),
            "tvos" => Ok(Platform::TvOS),
            "watchos" => Ok(Platform::WatchOS),
            "linux" => Ok(Platform::Linux),
            "android" => Ok(Platform::Android),
            "windows" => Ok(Platform::Windows),
            "wasi" => Ok(Platform::Wasi),
            "freebsd" => Ok(Platform::FreeBSD),
            other => Err(ParseError::new(
                s,
                ParseErrorKind::UnknownPlatform(other.to_string()),
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A minimum deployment version such as `10.13` or `13.0.1`.
///
/// Unlike a package version this never carries pre-release or build
/// metadata; ordering is plain numeric ordering on the three components.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PlatformVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> PlatformVersion {
        PlatformVersion {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for PlatformVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<PlatformVersion, ParseError> {
        let invalid = || ParseError::new(s, ParseErrorKind::InvalidVersion(s.to_string()));
        let mut parts = s.split('.');
        let mut component = |required: bool| -> Result<Option<u32>, ParseError> {
            match parts.next() {
                Some(p) => p.parse::<u32>().map(Some).map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(None),
            }
        };
        let major = component(true)?.unwrap();
        let minor = component(false)?.unwrap_or(0);
        let patch = component(false)?.unwrap_or(0);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(PlatformVersion::new(major, minor, patch))
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        Ok(())
    }
}
