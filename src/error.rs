//! CLI-layer errors: the file-system preconditions the core library has no
//! opinion on, plus a thin wrapper around [`blpkc::Error`] so every command
//! function can return a single error type.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CliError {
    OutputExists(PathBuf),
    ExtensionMismatch(PathBuf),
    FileNotFound(PathBuf),
    Io(std::io::Error),
    Core(blpkc::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::OutputExists(p) => {
                write!(f, "output file already exists: {} (use -f/--force to overwrite)", p.display())
            }
            CliError::ExtensionMismatch(p) => {
                write!(f, "{} does not have the expected .blp extension", p.display())
            }
            CliError::FileNotFound(p) => write!(f, "no such file: {}", p.display()),
            CliError::Io(e) => write!(f, "{}", e),
            CliError::Core(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<blpkc::Error> for CliError {
    fn from(e: blpkc::Error) -> Self {
        CliError::Core(e)
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
