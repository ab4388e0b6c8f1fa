use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A fully resolved command invocation: the program to run and its
/// arguments, ready for a build executor to spawn.
#[derive(Clone, Debug, Serialize)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Invocation {
        Invocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Invocation {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            shell_escape::escape(self.program.display().to_string().into())
        )?;
        for arg in &self.args {
            write!(f, " {}", shell_escape::escape(arg.into()))?;
        }
        Ok(())
    }
}
