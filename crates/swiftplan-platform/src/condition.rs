use crate::error::{ParseError, ParseErrorKind};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a build is for debugging or for release.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    Debug,
    Release,
}

impl Configuration {
    /// Directory name under the build data path.
    pub fn dirname(&self) -> &'static str {
        match self {
            Configuration::Debug => "debug",
            Configuration::Release => "release",
        }
    }
}

impl FromStr for Configuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Configuration, ParseError> {
        match s {
            "debug" => Ok(Configuration::Debug),
            "release" => Ok(Configuration::Release),
            other => Err(ParseError::new(
                s,
                ParseErrorKind::UnknownConfiguration(other.to_string()),
            )),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dirname())
    }
}

/// The environment a condition is evaluated against: the platform being
/// built for and the active configuration.
///
/// Bare-metal triples such as `wasm32-unknown-none` have no manifest
/// platform; against such an environment only conditions with an empty
/// platform list can match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BuildEnvironment {
    pub platform: Option<Platform>,
    pub configuration: Configuration,
}

impl BuildEnvironment {
    pub fn new(platform: Platform, configuration: Configuration) -> BuildEnvironment {
        BuildEnvironment {
            platform: Some(platform),
            configuration,
        }
    }

    pub fn bare(configuration: Configuration) -> BuildEnvironment {
        BuildEnvironment {
            platform: None,
            configuration,
        }
    }
}

/// An optional restriction on a dependency edge or build setting.
///
/// An empty platform list places no platform restriction; an absent
/// configuration places no configuration restriction. An edge with no
/// condition at all is always active.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct BuildCondition {
    pub platforms: Vec<Platform>,
    pub configuration: Option<Configuration>,
}

impl BuildCondition {
    pub fn when_platforms(platforms: Vec<Platform>) -> BuildCondition {
        BuildCondition {
            platforms,
            configuration: None,
        }
    }

    pub fn when_configuration(configuration: Configuration) -> BuildCondition {
        BuildCondition {
            platforms: Vec::new(),
            configuration: Some(configuration),
        }
    }

    pub fn satisfied_by(&self, env: &BuildEnvironment) -> bool {
        if !self.platforms.is_empty() {
            match env.platform {
                Some(platform) if self.platforms.contains(&platform) => {}
                _ => return false,
            }
        }
        match self.configuration {
            Some(configuration) => configuration == env.configuration,
            None => true,
        }
    }
}

/// Evaluate an edge's optional condition: unconditional edges are always
/// satisfied.
pub fn condition_satisfied(condition: Option<&BuildCondition>, env: &BuildEnvironment) -> bool {
    condition.map_or(true, |c| c.satisfied_by(env))
}
