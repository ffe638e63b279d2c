use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(data: &Value, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", to_json(data, pretty)?),
        OutputFormat::Table => render_table(data),
    }
    Ok(())
}

/// Classified failures go to stdout as a JSON payload, everything else to
/// stderr as plain text.
pub fn render_error(error: &CliError, pretty: bool) {
    if let CliError::Request(response) = error {
        match serde_json::to_value(response.as_ref()).and_then(|value| to_json(&value, pretty)) {
            Ok(payload) => println!("{payload}"),
            Err(_) => eprintln!("error: {error}"),
        }
        return;
    }
    eprintln!("error: {error}");
}

fn to_json(data: &Value, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    }
}

fn render_table(data: &Value) {
    let Value::Object(fields) = data else {
        println!("{data}");
        return;
    };

    for (key, value) in fields {
        match value {
            Value::Array(rows) => {
                println!("{key} ({}):", rows.len());
                for row in rows {
                    println!("  - {}", table_row(row));
                }
            }
            other => println!("{key:<22}: {}", scalar(other)),
        }
    }
}

fn table_row(row: &Value) -> String {
    match row {
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| format!("{key}={}", scalar(value)))
            .collect::<Vec<_>>()
            .join("  "),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
