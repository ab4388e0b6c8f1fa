use std::fmt;

/// Failure to parse a triple, platform name, or platform version.
#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
    orig: String,
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    UnknownArch(String),
    UnknownOs(String),
    MissingOs,
    InvalidVersion(String),
    UnknownPlatform(String),
    UnknownConfiguration(String),
}

impl ParseError {
    pub fn new(orig: &str, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            orig: orig.to_string(),
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse `{}` as a ", self.orig)?;
        match &self.kind {
            ParseErrorKind::UnknownArch(arch) => {
                write!(f, "triple: unknown architecture `{arch}`")
            }
            ParseErrorKind::UnknownOs(os) => write!(f, "triple: unknown operating system `{os}`"),
            ParseErrorKind::MissingOs => write!(f, "triple: no operating system component"),
            ParseErrorKind::InvalidVersion(v) => {
                write!(f, "platform version: `{v}` is not dotted-decimal")
            }
            ParseErrorKind::UnknownPlatform(p) => write!(f, "platform name: `{p}` is not known"),
            ParseErrorKind::UnknownConfiguration(c) => {
                write!(f, "configuration: expected `debug` or `release`, found `{c}`")
            }
        }
    }
}

impl std::error::Error for ParseError {}
