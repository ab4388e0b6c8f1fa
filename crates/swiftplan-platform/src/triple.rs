use crate::error::{ParseError, ParseErrorKind};
use crate::platform::{Platform, PlatformVersion};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed target triple: architecture, vendor, operating system, and an
/// optional environment, plus an optional platform version carried on the
/// OS component (`arm64-apple-macosx10.15`).
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    arch: Arch,
    vendor: Vendor,
    os: Os,
    env: Option<String>,
    version: Option<PlatformVersion>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    I686,
    Aarch64,
    Armv7,
    Wasm32,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Apple,
    Pc,
    Unknown,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    MacOSX,
    IOS,
    TvOS,
    WatchOS,
    Linux,
    Windows,
    Wasi,
    FreeBSD,
    /// Bare-metal, e.g. `wasm32-unknown-none`.
    None,
}

impl Triple {
    pub fn new(arch: Arch, vendor: Vendor, os: Os) -> Triple {
        Triple {
            arch,
            vendor,
            os,
            env: None,
            version: None,
        }
    }

    pub fn with_env(mut self, env: &str) -> Triple {
        self.env = Some(env.to_string());
        self
    }

    /// The same triple with its OS version replaced.
    pub fn with_version(&self, version: Option<PlatformVersion>) -> Triple {
        Triple {
            version,
            ..self.clone()
        }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn environment(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn version(&self) -> Option<PlatformVersion> {
        self.version
    }

    /// Canonical architecture spelling for this triple's OS.
    pub fn arch_name(&self) -> &'static str {
        self.arch.canonical_name(self.os)
    }

    /// The manifest-level platform this triple builds for, if it has one.
    /// Bare-metal targets such as `wasm32-unknown-none` have none.
    pub fn platform(&self) -> Option<Platform> {
        match self.os {
            Os::MacOSX => Some(Platform::MacOS),
            Os::IOS => Some(Platform::IOS),
            Os::TvOS => Some(Platform::TvOS),
            Os::WatchOS => Some(Platform::WatchOS),
            Os::Linux if self.is_android() => Some(Platform::Android),
            Os::Linux => Some(Platform::Linux),
            Os::Windows => Some(Platform::Windows),
            Os::Wasi => Some(Platform::Wasi),
            Os::FreeBSD => Some(Platform::FreeBSD),
            Os::None => None,
        }
    }

    pub fn is_darwin(&self) -> bool {
        matches!(self.os, Os::MacOSX | Os::IOS | Os::TvOS | Os::WatchOS)
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    pub fn is_android(&self) -> bool {
        self.os == Os::Linux && self.env.as_deref() == Some("android")
    }

    pub fn is_freebsd(&self) -> bool {
        self.os == Os::FreeBSD
    }

    pub fn is_wasi(&self) -> bool {
        self.os == Os::Wasi
    }

    pub fn is_wasm(&self) -> bool {
        self.arch == Arch::Wasm32
    }

    /// File extension of executables, without the leading dot. Empty on
    /// platforms whose executables are extensionless.
    pub fn executable_extension(&self) -> &'static str {
        if self.is_windows() {
            "exe"
        } else if self.is_wasm() {
            "wasm"
        } else {
            ""
        }
    }

    pub fn dynamic_library_extension(&self) -> &'static str {
        if self.is_darwin() {
            "dylib"
        } else if self.is_windows() {
            "dll"
        } else {
            "so"
        }
    }

    pub fn static_library_prefix(&self) -> &'static str {
        if self.is_windows() {
            ""
        } else {
            "lib"
        }
    }

    pub fn static_library_extension(&self) -> &'static str {
        if self.is_windows() {
            "lib"
        } else {
            "a"
        }
    }

    pub fn dynamic_library_prefix(&self) -> &'static str {
        if self.is_windows() {
            ""
        } else {
            "lib"
        }
    }
}

impl Arch {
    /// Canonical spelling for the given OS: Darwin spells the 64-bit ARM
    /// architecture `arm64`, everything else `aarch64`.
    fn canonical_name(&self, os: Os) -> &'static str {
        let darwin = matches!(os, Os::MacOSX | Os::IOS | Os::TvOS | Os::WatchOS);
        match self {
            Arch::X86_64 => "x86_64",
            Arch::I686 => "i686",
            Arch::Aarch64 if darwin => "arm64",
            Arch::Aarch64 => "aarch64",
            Arch::Armv7 => "armv7",
            Arch::Wasm32 => "wasm32",
        }
    }
}

impl FromStr for Arch {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Arch, ParseError> {
        match s {
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "i686" | "i386" => Ok(Arch::I686),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            "armv7" | "arm" => Ok(Arch::Armv7),
            "wasm32" => Ok(Arch::Wasm32),
            other => Err(ParseError::new(
                s,
                ParseErrorKind::UnknownArch(other.to_string()),
            )),
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vendor::Apple => "apple",
            Vendor::Pc => "pc",
            Vendor::Unknown => "unknown",
        })
    }
}

impl Os {
    fn name(&self) -> &'static str {
        match self {
            Os::MacOSX => "macosx",
            Os::IOS => "ios",
            Os::TvOS => "tvos",
            Os::WatchOS => "watchos",
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::Wasi => "wasi",
            Os::FreeBSD => "freebsd",
            Os::None => "none",
        }
    }
}

/// Split an OS component like `macosx10.15` into the bare OS name and its
/// trailing version, if any.
fn parse_os(component: &str, orig: &str) -> Result<(Os, Option<PlatformVersion>), ParseError> {
    let split = component
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(component.len());
    let (name, rest) = component.split_at(split);
    let os = match name {
        "macosx" | "macos" | "darwin" => Os::MacOSX,
        "ios" => Os::IOS,
        "tvos" => Os::TvOS,
        "watchos" => Os::WatchOS,
        "linux" => Os::Linux,
        "windows" => Os::Windows,
        "wasi" => Os::Wasi,
        "freebsd" => Os::FreeBSD,
        "none" => Os::None,
        other => {
            return Err(ParseError::new(
                orig,
                ParseErrorKind::UnknownOs(other.to_string()),
            ))
        }
    };
    let version = if rest.is_empty() {
        None
    } else {
        Some(
            rest.parse::<PlatformVersion>()
                .map_err(|_| ParseError::new(orig, ParseErrorKind::InvalidVersion(rest.to_string())))?,
        )
    };
    Ok((os, version))
}

fn is_os_component(component: &str) -> bool {
    let split = component
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(component.len());
    matches!(
        &component[..split],
        "macosx" | "macos" | "darwin" | "ios" | "tvos" | "watchos" | "linux" | "windows" | "wasi"
            | "freebsd"
            | "none"
    )
}

impl FromStr for Triple {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Triple, ParseError> {
        let components: Vec<&str> = s.split('-').collect();
        if components.len() < 2 {
            return Err(ParseError::new(s, ParseErrorKind::MissingOs));
        }
        let arch = components[0]
            .parse::<Arch>()
            .map_err(|_| ParseError::new(s, ParseErrorKind::UnknownArch(components[0].to_string())))?;

        // The vendor may be omitted (`aarch64-linux-android`), so locate
        // the OS component by name rather than by position.
        let os_index = match components[1..].iter().position(|c| is_os_component(c)) {
            Some(i) => i + 1,
            None => {
                let guess = components.last().unwrap();
                let split = guess
                    .find(|c: char| c.is_ascii_digit())
                    .unwrap_or(guess.len());
                return Err(ParseError::new(
                    s,
                    ParseErrorKind::UnknownOs(guess[..split].to_string()),
                ));
            }
        };
        let vendor = match os_index {
            1 => Vendor::Unknown,
            _ => match components[1] {
                "apple" => Vendor::Apple,
                "pc" => Vendor::Pc,
                _ => Vendor::Unknown,
            },
        };
        let (os, version) = parse_os(components[os_index], s)?;
        let env = components.get(os_index + 1).map(|e| e.to_string());
        Ok(Triple {
            arch,
            vendor,
            os,
            env,
            version,
        })
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.arch.canonical_name(self.os),
            self.vendor,
            self.os.name()
        )?;
        if let Some(version) = self.version {
            write!(f, "{version}")?;
        }
        if let Some(env) = &self.env {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}
