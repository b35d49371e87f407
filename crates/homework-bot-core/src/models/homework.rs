//! Homework records and status translation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Key holding the homework title inside a record
pub const HOMEWORK_NAME_KEY: &str = "homework_name";
/// Key holding the review status inside a record
pub const STATUS_KEY: &str = "status";

/// Review status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeworkStatus {
    /// Reviewed and accepted
    Approved,
    /// Taken for review
    Reviewing,
    /// Reviewed with remarks
    Rejected,
}

impl HomeworkStatus {
    /// Every known status
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Wire name of the status
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Human readable verdict sent to the chat
    pub fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Review complete: the reviewer liked everything. Hooray!",
            Self::Reviewing => "The submission has been taken for review.",
            Self::Rejected => "Review complete: the reviewer left some remarks.",
        }
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HomeworkStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// One homework entry as returned by the API.
///
/// Kept as a raw JSON object: which keys are missing is itself reported
/// to the chat, so typing happens in [`format_status`].
#[derive(Debug, Clone, PartialEq)]
pub struct HomeworkRecord(Map<String, Value>);

impl HomeworkRecord {
    /// Wrap an already decoded JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TryFrom<Value> for HomeworkRecord {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::shape(format!(
                "homework record must be a mapping, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Build the chat message for a homework record
pub fn format_status(record: &HomeworkRecord) -> Result<String> {
    let name = record
        .get(HOMEWORK_NAME_KEY)
        .ok_or_else(|| Error::missing_key(HOMEWORK_NAME_KEY))?;
    let name = name.as_str().ok_or_else(|| {
        Error::shape(format!(
            "\"{HOMEWORK_NAME_KEY}\" must be a string, got {}",
            json_kind(name)
        ))
    })?;

    let status = record
        .get(STATUS_KEY)
        .ok_or_else(|| Error::missing_key(STATUS_KEY))?;
    let status: HomeworkStatus = match status {
        Value::String(s) => s.parse()?,
        other => return Err(Error::UnknownStatus(other.to_string())),
    };

    Ok(format!(
        "Status changed for submission \"{name}\". {}",
        status.verdict()
    ))
}

/// Short name of a JSON value's type, for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
