//! Parsing and validation shared by the `compress` and `append` subcommands:
//! human-readable sizes, codec/checksum names, and the `CompressConfig` /
//! `AppendConfig` structs those subcommands build.

use std::path::PathBuf;

use blpkc::{Algorithm, Checksum};

use crate::error::{CliError, Result};

/// Parse a size like `1048576`, `64KiB`, `16MiB` or `max`. `max` is returned
/// as `None`, meaning "let the writer pick chunk_size".
pub fn parse_chunk_size(text: &str) -> Result<Option<u32>> {
    if text.eq_ignore_ascii_case("max") {
        return Ok(None);
    }
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    let unit: &str = &text[digits.len()..];
    let value: u64 = digits
        .parse()
        .map_err(|_| CliError::Core(blpkc::Error::ChunkSizeOutOfRange))?;
    let bytes = match unit.trim() {
        "" | "B" => value,
        "KiB" => value * 1024,
        "MiB" => value * 1024 * 1024,
        "GiB" => value * 1024 * 1024 * 1024,
        _ => return Err(CliError::Core(blpkc::Error::ChunkSizeOutOfRange)),
    };
    if bytes == 0 || bytes > u32::MAX as u64 {
        return Err(CliError::Core(blpkc::Error::ChunkSizeOutOfRange));
    }
    Ok(Some(bytes as u32))
}

pub fn parse_codec(name: &str) -> Result<Algorithm> {
    Algorithm::from_name(name).ok_or_else(|| CliError::Core(blpkc::Error::UnknownCodec(name.to_string())))
}

pub fn parse_checksum(name: &str) -> Result<Checksum> {
    Checksum::from_name(name).ok_or_else(|| CliError::Core(blpkc::Error::UnknownChecksum(name.to_string())))
}

pub fn parse_nthreads(value: usize) -> Result<usize> {
    if value == 0 || value > 256 {
        return Err(CliError::Core(blpkc::Error::NthreadsOutOfRange));
    }
    Ok(value)
}

/// Read a JSON metadata value, either from a literal `{...}` argument or
/// from a file when the argument starts with `@`.
pub fn read_metadata(arg: &str) -> Result<serde_json::Value> {
    let text = if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path)?
    } else {
        arg.to_string()
    };
    serde_json::from_str(&text)
        .map_err(|e| CliError::Core(blpkc::Error::Decode(format!("invalid metadata JSON: {e}"))))
}

/// Default output path for `compress`: `<in>.blp`.
pub fn default_compress_output(input: &std::path::Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".blp");
    PathBuf::from(name)
}

/// Default output path for `decompress`: `<in>` with a trailing `.blp`
/// stripped. Fails with [`CliError::ExtensionMismatch`] if there is nothing
/// to strip and no explicit output was given.
pub fn default_decompress_output(input: &std::path::Path) -> Result<PathBuf> {
    match input.to_str().and_then(|s| s.strip_suffix(".blp")) {
        Some(stripped) => Ok(PathBuf::from(stripped)),
        None => Err(CliError::ExtensionMismatch(input.to_path_buf())),
    }
}

pub fn check_extension(path: &std::path::Path, enabled: bool) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("blp") => Ok(()),
        _ => Err(CliError::ExtensionMismatch(path.to_path_buf())),
    }
}

pub fn check_output_allowed(path: &std::path::Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(CliError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

pub fn require_input_exists(path: &std::path::Path) -> Result<()> {
    if !path.is_file() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}
