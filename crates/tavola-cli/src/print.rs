use serde::Serialize;

use crate::client::CliError;
use crate::editor::Notice;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Server(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{notice}");
    }
}

/// One `index<TAB>item` line per element.
pub fn print_positions<T: std::fmt::Display>(items: &[T]) {
    for (index, item) in items.iter().enumerate() {
        println!("{index}\t{item}");
    }
}
