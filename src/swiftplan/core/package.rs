use serde::{Deserialize, Serialize};
use std::fmt;
use swiftplan_platform::{Platform, PlatformVersion};

/// The identity of a package in the resolved graph. Identities are
/// lowercase and unique across the graph.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentity(String);

impl PackageIdentity {
    pub fn new(name: &str) -> PackageIdentity {
        PackageIdentity(name.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageIdentity {
    fn from(s: &str) -> PackageIdentity {
        PackageIdentity::new(s)
    }
}

/// Where a package was loaded from. Remote packages (source control or a
/// registry) get their compile warnings suppressed; root and local
/// packages do not.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PackageOrigin {
    Root,
    Local,
    Remote,
}

/// A package manifest's declared tools version, e.g. `5.9`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ToolsVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolsVersion {
    pub const V4: ToolsVersion = ToolsVersion { major: 4, minor: 0 };
    pub const V4_2: ToolsVersion = ToolsVersion { major: 4, minor: 2 };
    pub const V5: ToolsVersion = ToolsVersion { major: 5, minor: 0 };
    pub const V5_9: ToolsVersion = ToolsVersion { major: 5, minor: 9 };
    pub const V6: ToolsVersion = ToolsVersion { major: 6, minor: 0 };

    pub fn new(major: u32, minor: u32) -> ToolsVersion {
        ToolsVersion { major, minor }
    }

    /// The Swift language version compiled when the manifest selects none.
    pub fn default_swift_language_version(&self) -> &'static str {
        match (self.major, self.minor) {
            (0..=3, _) | (4, 0..=1) => "4",
            (4, _) => "4.2",
            (5, _) => "5",
            (_, _) => "6",
        }
    }

    /// Package-level namespacing (`-package-name`) arrived in 5.9.
    pub fn supports_package_naming(&self) -> bool {
        *self >= ToolsVersion::V5_9
    }

    /// Isolation and memory-safety settings arrived with the 6.0 manifest
    /// API.
    pub fn supports_safety_settings(&self) -> bool {
        *self >= ToolsVersion::V6
    }
}

impl fmt::Display for ToolsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A declared minimum deployment version for one platform.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SupportedPlatform {
    pub platform: Platform,
    pub version: PlatformVersion,
}

/// A package in the resolved graph. Modules and products carry their
/// owning package's identity; the package record itself holds what plan
/// construction needs from the manifest: origin, tools version, and the
/// declared platform minimums.
#[derive(Clone, Debug)]
pub struct Package {
    identity: PackageIdentity,
    origin: PackageOrigin,
    tools_version: ToolsVersion,
    platforms: Vec<SupportedPlatform>,
}

impl Package {
    pub fn new(
        identity: PackageIdentity,
        origin: PackageOrigin,
        tools_version: ToolsVersion,
        platforms: Vec<SupportedPlatform>,
    ) -> Package {
        Package {
            identity,
            origin,
            tools_version,
            platforms,
        }
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn origin(&self) -> PackageOrigin {
        self.origin
    }

    pub fn is_root(&self) -> bool {
        self.origin == PackageOrigin::Root
    }

    pub fn is_remote(&self) -> bool {
        self.origin == PackageOrigin::Remote
    }

    pub fn tools_version(&self) -> ToolsVersion {
        self.tools_version
    }

    pub fn platforms(&self) -> &[SupportedPlatform] {
        &self.platforms
    }

    /// The declared minimum version for `platform`, if the manifest
    /// declares one.
    pub fn minimum_platform_version(&self, platform: Platform) -> Option<PlatformVersion> {
        self.platforms
            .iter()
            .find(|p| p.platform == platform)
            .map(|p| p.version)
    }
}
