use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::args::ContentInput;
use crate::client::CliError;

pub fn read_value(val: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    if let Some(path) = file {
        read_file_string(&path)
    } else if let Some(v) = val {
        Ok(v)
    } else {
        Err(CliError::InvalidInput("value required".into()))
    }
}

pub fn read_file_string(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })
}

/// Content fragment from `--content`/`--content-file`, defaulting to `{}`.
pub fn read_fragment(input: ContentInput) -> Result<Map<String, Value>, CliError> {
    let raw = match read_value(input.content, input.content_file) {
        Ok(raw) => raw,
        Err(CliError::InvalidInput(_)) => return Ok(Map::new()),
        Err(err) => return Err(err),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::InvalidInput("content must be a JSON object".into())),
        Err(err) => Err(CliError::InvalidInput(format!("content is not valid JSON: {err}"))),
    }
}

/// Split `NAME=VALUE`.
pub fn parse_pair(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidInput(format!(
            "expected NAME=VALUE, got `{raw}`"
        ))),
    }
}
