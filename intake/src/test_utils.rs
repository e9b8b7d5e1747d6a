//! Test utilities shared by the unit and router tests.

use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;

use crate::config::Config;
use crate::notifications::MockNotifier;
use crate::storage::{Entry, Submission, SubmissionKind, Submissions};

/// A running test server backed by a private temporary directory.
pub struct TestApp {
    pub server: TestServer,
    pub notifier: MockNotifier,
    pub config: Config,
    _dir: TempDir,
}

impl TestApp {
    /// Leads currently on disk that parse as submissions.
    pub async fn leads(&self) -> Vec<Submission> {
        Submissions::new(SubmissionKind::Lead, self.config.storage.leads_path())
            .load_all()
            .await
            .into_iter()
            .filter_map(Entry::into_record)
            .collect()
    }

    /// Diagnoses currently on disk that parse as submissions.
    pub async fn diagnoses(&self) -> Vec<Submission> {
        Submissions::new(SubmissionKind::Diagnosis, self.config.storage.diagnoses_path())
            .load_all()
            .await
            .into_iter()
            .filter_map(Entry::into_record)
            .collect()
    }

    /// Names of the files in the uploads directory, sorted.
    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.config.storage.uploads_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub fn create_test_config(root: &std::path::Path) -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: root.join("public"),
        ..Default::default()
    };
    config.storage.data_dir = root.join("data");
    config.storage.uploads_dir = root.join("uploads");
    config
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Like [`create_test_app`], with a chance to adjust the configuration first.
pub async fn create_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = create_test_config(dir.path());
    customize(&mut config);

    let notifier = MockNotifier::new();
    let app = crate::Application::new_with_notifier(config.clone(), Some(Arc::new(notifier.clone())))
        .await
        .expect("Failed to create application");

    TestApp {
        server: app.into_test_server(),
        notifier,
        config,
        _dir: dir,
    }
}

/// Encode parts as a `multipart/form-data` body, the way browsers do.
///
/// Each part is `(name, filename, data)`; a filename makes it a file part.
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n").as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            }
            None => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
