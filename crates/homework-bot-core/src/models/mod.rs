//! Data models for the homework bot

mod homework;

pub(crate) use homework::json_kind;
pub use homework::{format_status, HomeworkRecord, HomeworkStatus, HOMEWORK_NAME_KEY, STATUS_KEY};
