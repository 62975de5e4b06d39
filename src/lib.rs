//! Student registration and QR-scan attendance service.
//!
//! Two SQLite stores back the service: the Directory (`student_data.db`,
//! students and subjects) and the Ledger (`attendance.db`, one attendance
//! row per student and subject). Every API operation answers with a JSON
//! envelope carrying `success`; failures never use an HTTP error status.

pub mod api;
pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod qr;
pub mod server;
