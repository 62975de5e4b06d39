use crate::api::error::ServiceError;
use crate::config::Config;
use crate::db::{self, Subject};
use anyhow::{anyhow, Context};
use rusqlite::Connection;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub params: serde_json::Value,
}

impl Request {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Shared by every handler. Schema setup and seeding happen once in
/// [`AppState::initialize`]; handlers then open plain connections per call.
/// Only the active subject lives in memory and is lost on restart.
pub struct AppState {
    pub config: Config,
    active_subject: Mutex<Subject>,
}

impl AppState {
    /// Creates the storage directories, bootstraps both stores and resolves
    /// the configured default subject.
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.qr_dir).with_context(|| {
            format!("failed to create QR directory {}", config.qr_dir.display())
        })?;
        let directory = db::open_directory(&config.data_dir)?;
        drop(db::open_ledger(&config.data_dir)?);

        let default_subject = db::subject_get(&directory, &config.default_subject)?
            .ok_or_else(|| {
                anyhow!(
                    "default subject {} is not a known subject",
                    config.default_subject
                )
            })?;

        Ok(Self {
            config,
            active_subject: Mutex::new(default_subject),
        })
    }

    pub fn directory(&self) -> Result<Connection, ServiceError> {
        Ok(db::connect_directory(&self.config.data_dir)?)
    }

    pub fn ledger(&self) -> Result<Connection, ServiceError> {
        Ok(db::connect_ledger(&self.config.data_dir)?)
    }

    pub fn active_subject(&self) -> Result<Subject, ServiceError> {
        self.active_subject
            .lock()
            .map(|s| s.clone())
            .map_err(|_| ServiceError::Unclassified("active subject lock poisoned".into()))
    }

    pub fn replace_active_subject(&self, subject: Subject) -> Result<(), ServiceError> {
        let mut guard = self
            .active_subject
            .lock()
            .map_err(|_| ServiceError::Unclassified("active subject lock poisoned".into()))?;
        *guard = subject;
        Ok(())
    }
}
