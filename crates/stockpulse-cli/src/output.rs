use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::commands::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct FetchedDocument<'a> {
    origin: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDocument<'a>>,
    data: &'a Value,
}

#[derive(Debug, Serialize)]
struct ErrorDocument<'a> {
    kind: &'a str,
    category: &'a str,
    message: &'a str,
}

pub fn render(result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let rendered = to_json(result, pretty)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn to_json(result: &CommandResult, pretty: bool) -> Result<String, CliError> {
    let rendered = match result.origin {
        Some(origin) => {
            let document = FetchedDocument {
                origin,
                error: result.stale_error.as_ref().map(|error| ErrorDocument {
                    kind: error.kind().as_str(),
                    category: error.category(),
                    message: error.message(),
                }),
                data: &result.data,
            };
            if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            }
        }
        None if pretty => serde_json::to_string_pretty(&result.data)?,
        None => serde_json::to_string(&result.data)?,
    };
    Ok(rendered)
}
