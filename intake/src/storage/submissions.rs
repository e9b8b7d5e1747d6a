//! Lead and diagnosis stores.

use std::path::PathBuf;

use chrono::Local;

use super::collection::{Entry, JsonCollection};
use super::errors::Result;
use super::models::{NewSubmission, Submission, SubmissionKind};

/// One logical submission collection (leads or diagnoses).
pub struct Submissions {
    kind: SubmissionKind,
    collection: JsonCollection<Submission>,
}

impl Submissions {
    pub fn new(kind: SubmissionKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            collection: JsonCollection::new(path),
        }
    }

    pub fn kind(&self) -> SubmissionKind {
        self.kind
    }

    pub async fn ensure_exists(&self) -> Result<()> {
        self.collection.ensure_exists().await
    }

    /// Every stored element, including ones that do not parse as a [`Submission`].
    pub async fn load_all(&self) -> Vec<Entry<Submission>> {
        self.collection.load_all().await
    }

    /// Assign bookkeeping fields to `new` and append it. Returns the stored record.
    pub async fn append(&self, new: NewSubmission) -> Result<Submission> {
        let submission = new.into_submission(self.kind, &Local::now());
        self.collection.append(submission).await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        self.collection.delete_by_id(id).await
    }
}
