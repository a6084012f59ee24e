#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use argon2::Params;
use async_trait::async_trait;
use catalog_admin_api::{
    clock::ManualClock,
    config::AppConfig,
    error::{AppError, AppResult},
    notify::Notifier,
    state::AppState,
    storage::{MemoryStorage, Storage},
    store::{Catalog, CredentialPolicy},
};
use chrono::{TimeZone, Utc};
use serde_json::Value;

pub const TEST_SECRET: &str = "test-secret-key";

/// Cheap hashing so tests are not dominated by argon2.
pub fn fast_policy() -> CredentialPolicy {
    with_fast_hashing(CredentialPolicy::default())
}

pub fn with_fast_hashing(policy: CredentialPolicy) -> CredentialPolicy {
    CredentialPolicy {
        hash_params: Params::new(1024, 1, 1, None).expect("argon2 params"),
        ..policy
    }
}

pub fn start_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    ))
}

/// Remembers every message handed to it.
#[derive(Default)]
pub struct CapturingNotifier {
    pub codes: Mutex<Vec<(String, String)>>,
    pub changed: Mutex<Vec<String>>,
}

impl CapturingNotifier {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send_reset_code(&self, email: &str, code: &str) -> AppResult<()> {
        self.codes
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }

    async fn password_changed(&self, email: &str) -> AppResult<()> {
        self.changed.lock().unwrap().push(email.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<CapturingNotifier>,
    pub clock: Arc<ManualClock>,
}

pub fn test_app(config: AppConfig) -> TestApp {
    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(CapturingNotifier::default());
    let clock = start_clock();
    let state = AppState::new(
        Catalog::new(with_fast_hashing(config.credential_policy())),
        storage.clone(),
        notifier.clone(),
        clock.clone(),
        config,
    );
    TestApp {
        state,
        storage,
        notifier,
        clock,
    }
}

/// Notifier whose deliveries always fail.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_reset_code(&self, _email: &str, _code: &str) -> AppResult<()> {
        Err(AppError::Internal(anyhow::anyhow!("mail relay unavailable")))
    }

    async fn password_changed(&self, _email: &str) -> AppResult<()> {
        Err(AppError::Internal(anyhow::anyhow!("mail relay unavailable")))
    }
}

/// Storage that reads as empty and rejects every write.
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn get(&self, _key: &str) -> AppResult<Option<Value>> {
        Ok(None)
    }

    async fn put_many(&self, _entries: Vec<(&'static str, Value)>) -> AppResult<()> {
        Err(AppError::Internal(anyhow::anyhow!("disk full")))
    }

    async fn remove_many(&self, _keys: &[&'static str]) -> AppResult<()> {
        Err(AppError::Internal(anyhow::anyhow!("disk full")))
    }
}

/// State over an existing catalog with the given collaborators.
pub fn state_with(
    catalog: Catalog,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
) -> AppState {
    AppState::new(
        catalog,
        storage,
        notifier,
        start_clock(),
        AppConfig::with_secret(TEST_SECRET),
    )
}
