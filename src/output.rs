//! Rendering resolved flags as shell export statements.

use crate::config::{shell_var_name, Config, ValueType};
use crate::store::ArgStore;
use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Escape a string for safe use in a shell double-quoted context.
///
/// Escapes: $, `, \, and ". Everything else, including newlines and `!`,
/// is literal inside double quotes when the file is sourced.
fn escape_shell_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' | '`' | '\\' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Read every configured key from the store with its type and default.
///
/// Returns export stem -> rendered value. Booleans render as
/// "true"/"false", integers in decimal.
pub fn resolve_exports(config: &Config, store: &ArgStore) -> HashMap<String, String> {
    let mut values = HashMap::with_capacity(config.keys.len());

    for key in &config.keys {
        let rendered = match key.value_type {
            ValueType::String => store
                .get_str_or(&key.key, key.default.as_deref().unwrap_or(""))
                .to_string(),
            ValueType::Bool => store
                .get_bool_or(&key.key, key.bool_default().unwrap_or(false))
                .to_string(),
            ValueType::Int => store
                .get_int(&key.key, key.int_default().unwrap_or(0))
                .to_string(),
        };
        values.insert(key.effective_name().to_string(), rendered);
    }

    values
}

/// Generate a temporary file with shell export statements.
///
/// Returns the path to the temporary file. The file will persist
/// until it's manually deleted.
pub fn generate_output(values: &HashMap<String, String>, prefix: &str) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(generate_output_string(values, prefix).as_bytes())?;

    // Persist the file (don't delete on drop)
    let path = file.into_temp_path().keep()?;
    Ok(path)
}

/// Generate the export statements as a string, sorted by name.
pub fn generate_output_string(values: &HashMap<String, String>, prefix: &str) -> String {
    let mut output = String::new();

    let mut names: Vec<_> = values.keys().collect();
    names.sort();

    for name in names {
        let var_name = format!("{}{}", prefix, shell_var_name(name));
        let escaped_value = escape_shell_value(&values[name]);
        output.push_str(&format!("export {}=\"{}\"\n", var_name, escaped_value));
    }

    output
}
