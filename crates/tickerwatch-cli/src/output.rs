use std::io::Write;

use serde::Serialize;

use crate::commands::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    command: &'a str,
    data: &'a serde_json::Value,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
}

/// Write one JSON document for `result` to stdout.
pub fn render(result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_envelope(&mut handle, result, pretty)?;
    handle.flush()?;
    Ok(())
}

fn write_envelope<W: Write>(writer: &mut W, result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let envelope = Envelope {
        command: result.command,
        data: &result.data,
        warnings: &result.warnings,
    };
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, &envelope)?;
    } else {
        serde_json::to_writer(&mut *writer, &envelope)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn compact_output_is_one_line_without_empty_warnings() {
        let result = CommandResult::ok("list", json!({ "tickers": ["AAPL"] }));
        let mut buffer = Vec::new();

        write_envelope(&mut buffer, &result, false).expect("writes");

        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text, "{\"command\":\"list\",\"data\":{\"tickers\":[\"AAPL\"]}}\n");
    }

    #[test]
    fn warnings_are_included_when_present() {
        let result = CommandResult::ok("add", json!({})).with_warning("saved locally only");
        let mut buffer = Vec::new();

        write_envelope(&mut buffer, &result, true).expect("writes");

        let parsed: serde_json::Value =
            serde_json::from_slice(&buffer).expect("valid json");
        assert_eq!(parsed["warnings"], json!(["saved locally only"]));
    }
}
