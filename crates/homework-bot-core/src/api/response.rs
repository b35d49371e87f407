//! Shape checks for the homework status payload

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{json_kind, HomeworkRecord};

/// Key holding the list of homework records
pub const HOMEWORKS_KEY: &str = "homeworks";
/// Key holding the server timestamp to poll from next time
pub const CURRENT_DATE_KEY: &str = "current_date";

/// A structurally valid API response
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedResponse {
    /// Most recent record, if the server returned any
    pub latest: Option<HomeworkRecord>,
    /// Server timestamp for the next `from_date`
    pub current_date: i64,
}

/// Validate a decoded response and pick out the first homework record.
///
/// An empty `homeworks` list is a valid answer and yields `latest: None`.
pub fn check_response(response: Value) -> Result<CheckedResponse> {
    debug!("Checking API response");

    let mut body = match response {
        Value::Object(body) => body,
        other => {
            return Err(Error::shape(format!(
                "expected a mapping, got {}",
                json_kind(&other)
            )))
        }
    };

    let homeworks = body
        .remove(HOMEWORKS_KEY)
        .ok_or_else(|| Error::missing_key(HOMEWORKS_KEY))?;
    let current_date = body
        .remove(CURRENT_DATE_KEY)
        .ok_or_else(|| Error::missing_key(CURRENT_DATE_KEY))?;

    let homeworks = match homeworks {
        Value::Array(items) => items,
        other => {
            return Err(Error::shape(format!(
                "\"{HOMEWORKS_KEY}\" must be a sequence, got {}",
                json_kind(&other)
            )))
        }
    };

    let current_date = current_date.as_i64().ok_or_else(|| {
        Error::shape(format!(
            "\"{CURRENT_DATE_KEY}\" must be an integer, got {}",
            json_kind(&current_date)
        ))
    })?;

    let latest = homeworks
        .into_iter()
        .next()
        .map(HomeworkRecord::try_from)
        .transpose()?;

    Ok(CheckedResponse {
        latest,
        current_date,
    })
}
