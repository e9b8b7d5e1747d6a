//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Response bodies shared between handlers
//!
//! # API Structure
//!
//! - **Leads** (`/api/submit-lead`, `/api/leads`): first-stage contact requests
//! - **Diagnoses** (`/api/submit`, `/api/submissions`): detailed questionnaires with documents
//! - **Notifications** (`/api/telegram-config`, `/api/telegram-test`): operator bot settings
//!
//! Every other path is served from the static directory.

pub mod handlers;
pub mod models;
