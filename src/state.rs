use std::{future, sync::Arc};

use tokio::{sync::RwLock, task};

use crate::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    error::{AppError, AppResult},
    notify::{LogNotifier, Notifier},
    storage::Storage,
    store::{self, Catalog, CredentialStore, EntityCache},
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<Catalog>>,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            storage,
            notifier,
            clock,
            config: Arc::new(config),
        }
    }

    /// Load the catalog from `storage` and wire up the default collaborators.
    pub async fn load(config: AppConfig, storage: Arc<dyn Storage>) -> AppResult<Self> {
        let catalog = Catalog::load(storage.as_ref(), config.credential_policy()).await?;
        Ok(Self::new(
            catalog,
            storage,
            Arc::new(LogNotifier),
            Arc::new(SystemClock),
            config,
        ))
    }

    /// Apply `op` to a copy of the credential store, persist the copy, then
    /// publish it. On any error the live store is untouched.
    ///
    /// `op` runs on the blocking pool since most credential operations hash.
    pub async fn mutate_credentials<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CredentialStore) -> AppResult<T> + Send + 'static,
    {
        self.mutate_credentials_confirmed(op, |_| future::ready(Ok::<(), AppError>(())))
            .await
    }

    /// Like [`AppState::mutate_credentials`], but `confirm` must also succeed
    /// before anything is persisted or published.
    pub async fn mutate_credentials_confirmed<T, F, C, Fut>(
        &self,
        op: F,
        confirm: C,
    ) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CredentialStore) -> AppResult<T> + Send + 'static,
        C: FnOnce(&T) -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let mut catalog = self.catalog.write().await;
        let mut draft = catalog.credentials.clone();
        let (draft, out) = task::spawn_blocking(move || {
            let out = op(&mut draft)?;
            Ok::<_, AppError>((draft, out))
        })
        .await
        .map_err(anyhow::Error::from)??;

        confirm(&out).await?;
        store::save_credentials(self.storage.as_ref(), &draft).await?;
        catalog.credentials = draft;
        Ok(out)
    }

    /// Same as [`AppState::mutate_credentials`] for categories and products.
    /// Accounts are visible read-only for resolving owners.
    pub async fn mutate_entities<T>(
        &self,
        op: impl FnOnce(&mut EntityCache, &CredentialStore) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut catalog = self.catalog.write().await;
        let mut draft = catalog.entities.clone();
        let out = op(&mut draft, &catalog.credentials)?;
        store::save_entities(self.storage.as_ref(), &draft).await?;
        catalog.entities = draft;
        Ok(out)
    }
}
