//! Key/value persistence behind the catalog.
//!
//! Every record set is stored as one JSON document under a fixed key. Writes
//! that span several keys go through [`Storage::put_many`] so a mutation is
//! persisted whole or not at all.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};
use tokio::sync::Mutex;

use crate::error::AppResult;

pub mod keys {
    pub const USERS: &str = "users";
    pub const CATEGORIES: &str = "categories";
    pub const PRODUCTS: &str = "products";
    pub const OTP_STORE: &str = "otpStore";

    pub const TOKEN: &str = "token";
    pub const ROLE: &str = "role";
    pub const CURRENT_USER_EMAIL: &str = "currentUserEmail";
    pub const CURRENT_USER_NAME: &str = "currentUserName";
    pub const CURRENT_USER_MOBILE: &str = "currentUserMobile";
    pub const CURRENT_USER_ID: &str = "currentUserId";

    pub const SESSION: [&str; 6] = [
        TOKEN,
        ROLE,
        CURRENT_USER_EMAIL,
        CURRENT_USER_NAME,
        CURRENT_USER_MOBILE,
        CURRENT_USER_ID,
    ];
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    async fn put_many(&self, entries: Vec<(&'static str, Value)>) -> AppResult<()>;

    async fn remove_many(&self, keys: &[&'static str]) -> AppResult<()>;
}

/// Read a key and decode it. A missing key yields `None`.
pub async fn load<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> AppResult<Option<T>> {
    match storage.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn entry<T: Serialize + ?Sized>(key: &'static str, value: &T) -> AppResult<(&'static str, Value)> {
    Ok((key, serde_json::to_value(value)?))
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put_many(&self, entries: Vec<(&'static str, Value)>) -> AppResult<()> {
        let mut guard = self.entries.lock().await;
        for (key, value) in entries {
            guard.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&'static str]) -> AppResult<()> {
        let mut guard = self.entries.lock().await;
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

/// Postgres-backed storage; one row per key in `kv_store`.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[async_trait]
impl Storage for PgStorage {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let row: Option<(Json<Value>,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(value),)| value))
    }

    async fn put_many(&self, entries: Vec<(&'static str, Value)>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES ($1, $2, now())
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
                "#,
            )
            .bind(key)
            .bind(Json(value))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove_many(&self, keys: &[&'static str]) -> AppResult<()> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        sqlx::query("DELETE FROM kv_store WHERE key = ANY($1)")
            .bind(keys)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
