//! Persisted submission records.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collection::Record;

/// Which collection a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// First-stage contact request
    Lead,
    /// Second-stage detailed diagnosis, possibly with documents
    Diagnosis,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionKind::Lead => write!(f, "lead"),
            SubmissionKind::Diagnosis => write!(f, "diagnosis"),
        }
    }
}

/// A stored lead or diagnosis.
///
/// The bookkeeping fields are typed; everything else the caller submitted is kept verbatim in
/// [`Submission::fields`]. Field order on disk is `id`, caller fields, then bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Creation time in Unix milliseconds, unless the caller supplied an integer id
    pub id: i64,
    /// Caller-supplied fields, untyped
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "type")]
    pub kind: SubmissionKind,
    /// Stored name of the business registration document. `Some(None)` is an explicit null;
    /// `None` omits the key (leads).
    #[serde(
        rename = "bizFileServer",
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub biz_file_server: Option<Option<String>>,
    /// Stored name of the credit report document, same conventions as `biz_file_server`
    #[serde(
        rename = "creditFileServer",
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub credit_file_server: Option<Option<String>>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: String,
}

impl Submission {
    /// Look up a caller-supplied field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Record for Submission {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Files stored by the upload sink for a diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    pub biz_file: Option<String>,
    pub credit_file: Option<String>,
}

/// Caller input for a new submission, before bookkeeping fields are assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSubmission {
    pub fields: Map<String, Value>,
    pub attachments: Attachments,
}

impl NewSubmission {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            attachments: Attachments::default(),
        }
    }

    /// Merge caller input with bookkeeping fields.
    ///
    /// - `id`: caller integer id if given, else `now` in milliseconds
    /// - `type`: always `kind`
    /// - `submittedAt`: caller non-empty string if given, else `now` in display format
    /// - file fields: set from attachments for diagnoses (null when absent), omitted for leads
    pub fn into_submission<Tz>(self, kind: SubmissionKind, now: &DateTime<Tz>) -> Submission
    where
        Tz: TimeZone,
    {
        let Self { mut fields, attachments } = self;

        let id = fields
            .shift_remove("id")
            .and_then(|v| v.as_i64())
            .unwrap_or_else(|| now.timestamp_millis());

        let submitted_at = match fields.shift_remove("submittedAt") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => display_timestamp(now),
        };

        fields.shift_remove("type");

        let (biz_file_server, credit_file_server) = match kind {
            SubmissionKind::Diagnosis => {
                fields.shift_remove("bizFileServer");
                fields.shift_remove("creditFileServer");
                (Some(attachments.biz_file), Some(attachments.credit_file))
            }
            SubmissionKind::Lead => (None, None),
        };

        Submission {
            id,
            fields,
            kind,
            biz_file_server,
            credit_file_server,
            submitted_at,
        }
    }
}

/// Format a timestamp the way the Korean locale displays date and time,
/// e.g. `2026. 3. 7. 오후 2:05:09`.
pub fn display_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    let hour = at.hour();
    let meridiem = if hour < 12 { "오전" } else { "오후" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!(
        "{}. {}. {}. {} {}:{:02}:{:02}",
        at.year(),
        at.month(),
        at.day(),
        meridiem,
        hour12,
        at.minute(),
        at.second()
    )
}
