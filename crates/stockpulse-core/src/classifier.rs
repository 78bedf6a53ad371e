//! Maps transport outcomes onto the [`ErrorKind`] taxonomy.
//!
//! The upstream reports most failures as HTTP 200 with a sentinel text field
//! (`Information`, `Note` or `Error Message`) instead of an error status, so
//! a response body has to be inspected before it can be called a success.
//! Rules are evaluated in order and the first match wins:
//!
//! | # | Signal | Kind | Retry after |
//! |---|--------|------|-------------|
//! | 1 | transport timeout / aborted | `Timeout` | |
//! | 2 | no response (DNS, refused) | `NetworkError` | |
//! | 3 | call-frequency notice | `RateLimit` | 3600 s |
//! | 4 | daily quota notice | `RateLimit` | 86400 s |
//! | 5 | invalid API key notice | `InvalidCredentials` | |
//! | 6 | non-empty `Error Message` | `DataNotAvailable` | |
//! | 7 | premium endpoint notice | `DataNotAvailable` | |
//! | 8 | status >= 500 | `NetworkError` | |
//! | 9 | status 429 | `RateLimit` | 3600 s |
//! | 10 | anything else erroneous | `Unknown` | |
//!
//! Quota notices are checked before the generic `Error Message` rule because
//! the upstream sometimes returns a quota note next to an empty payload.
//! On a 2xx response only the sentinel fields are read; any other status has
//! its whole body scanned for notices.

use serde_json::{Map, Value};

use crate::http_client::{HttpError, HttpErrorKind, HttpResponse};
use crate::{ClassifiedError, ErrorKind};

pub const FREQUENCY_LIMIT_RETRY_AFTER_SECS: u64 = 3_600;
pub const DAILY_QUOTA_RETRY_AFTER_SECS: u64 = 86_400;

const INFORMATION_FIELD: &str = "Information";
const NOTE_FIELD: &str = "Note";
const ERROR_MESSAGE_FIELD: &str = "Error Message";

const FREQUENCY_PHRASES: &[&str] = &[
    "api call frequency",
    "calls per minute",
    "requests per minute",
    "per second",
];
const DAILY_QUOTA_PHRASES: &[&str] = &["per day", "daily rate limit", "daily limit", "daily quota"];
const INVALID_CREDENTIAL_PHRASES: &[&str] = &[
    "apikey is invalid",
    "api key is invalid",
    "invalid api key",
    "invalid apikey",
];
const PREMIUM_PHRASES: &[&str] = &["premium"];

/// Classify one attempt. `Ok` carries the parsed JSON body of a response
/// with no error signature.
pub fn classify(outcome: Result<HttpResponse, HttpError>) -> Result<Value, ClassifiedError> {
    match outcome {
        Ok(response) => classify_response(&response),
        Err(error) => Err(classify_transport_error(error)),
    }
}

/// Rules 1, 2 and the transport half of rule 10.
pub fn classify_transport_error(error: HttpError) -> ClassifiedError {
    let message = error.message().to_owned();
    let classified = match error.kind() {
        HttpErrorKind::Timeout => ClassifiedError::timeout(message),
        HttpErrorKind::Connect => ClassifiedError::network(message),
        HttpErrorKind::Other => ClassifiedError::unknown(message),
    };
    classified.with_cause(error)
}

/// Rules 3 to 11 for a response that did arrive.
pub fn classify_response(response: &HttpResponse) -> Result<Value, ClassifiedError> {
    let parsed = serde_json::from_str::<Value>(&response.body);

    // Error statuses are scanned in full: gateways put the notice in
    // arbitrary fields.
    let notice = match &parsed {
        Err(_) => response.body.to_ascii_lowercase(),
        Ok(_) if !response.is_success() => response.body.to_ascii_lowercase(),
        Ok(Value::Object(object)) => notice_text(object),
        Ok(_) => String::new(),
    };

    if let Some(error) = classify_notice(&notice) {
        return Err(error);
    }

    if let Ok(Value::Object(object)) = &parsed {
        if let Some(message) = non_empty_text(object, ERROR_MESSAGE_FIELD) {
            return Err(ClassifiedError::data_not_available(message));
        }
    }

    if contains_any(&notice, PREMIUM_PHRASES) {
        return Err(ClassifiedError::data_not_available(
            "endpoint requires a premium subscription",
        ));
    }

    if response.status >= 500 {
        return Err(ClassifiedError::network(format!(
            "upstream returned status {}",
            response.status
        )));
    }

    if response.status == 429 {
        return Err(ClassifiedError::rate_limited(
            "upstream returned status 429",
            FREQUENCY_LIMIT_RETRY_AFTER_SECS,
        ));
    }

    if !response.is_success() {
        return Err(ClassifiedError::unknown(format!(
            "upstream returned status {}",
            response.status
        )));
    }

    let body = match parsed {
        Ok(body) => body,
        Err(error) => {
            return Err(
                ClassifiedError::unknown(format!("response body is not valid JSON: {error}"))
                    .with_cause(error),
            );
        }
    };

    if let Value::Object(object) = &body {
        if is_bare_notice(object) {
            let text = non_empty_text(object, INFORMATION_FIELD)
                .or_else(|| non_empty_text(object, NOTE_FIELD))
                .unwrap_or("upstream returned a notice without data");
            return Err(ClassifiedError::unknown(text));
        }
    }

    Ok(body)
}

/// Rules 3 to 5: notices that can be recognised from their wording alone.
fn classify_notice(notice: &str) -> Option<ClassifiedError> {
    if notice.is_empty() {
        return None;
    }

    if contains_any(notice, FREQUENCY_PHRASES) {
        return Some(ClassifiedError::rate_limited(
            "API call frequency limit reached",
            FREQUENCY_LIMIT_RETRY_AFTER_SECS,
        ));
    }

    if contains_any(notice, DAILY_QUOTA_PHRASES) {
        return Some(ClassifiedError::rate_limited(
            "daily API request quota exhausted",
            DAILY_QUOTA_RETRY_AFTER_SECS,
        ));
    }

    if contains_any(notice, INVALID_CREDENTIAL_PHRASES) {
        return Some(ClassifiedError::new(
            ErrorKind::InvalidCredentials,
            "the API key was rejected",
        ));
    }

    None
}

/// Lowercased concatenation of every sentinel field.
fn notice_text(object: &Map<String, Value>) -> String {
    [INFORMATION_FIELD, NOTE_FIELD, ERROR_MESSAGE_FIELD]
        .iter()
        .filter_map(|field| non_empty_text(object, field))
        .collect::<Vec<_>>()
        .join("\n")
        .to_ascii_lowercase()
}

fn non_empty_text<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// A body made only of `Information`/`Note` carries no data at all.
fn is_bare_notice(object: &Map<String, Value>) -> bool {
    let has_notice = non_empty_text(object, INFORMATION_FIELD).is_some()
        || non_empty_text(object, NOTE_FIELD).is_some();
    has_notice
        && object
            .keys()
            .all(|key| key == INFORMATION_FIELD || key == NOTE_FIELD)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
