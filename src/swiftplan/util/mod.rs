pub use self::command::Invocation;
pub use self::diagnostics::Diagnostics;
pub use self::errors::{PlanError, PlanResult};
pub use self::fs::{FileSystem, InMemoryFileSystem, LocalFileSystem};

pub mod command;
pub mod diagnostics;
pub mod errors;
pub mod fs;
