use crate::{
    error::AppResult,
    models::{PublicUser, Role},
    storage::{self, Storage, keys},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub token: Option<String>,
    pub role: Role,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub mobile: String,
}

/// The identity of whoever is signed in on this client, if anyone.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn new() -> Self {
        Self::Anonymous
    }

    /// Record a successful login or register. Replaces any previous identity.
    pub fn establish(&mut self, user: &PublicUser, token: Option<String>) {
        *self = Session::Authenticated(Identity {
            token,
            role: user.role,
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            mobile: user.mobile.clone(),
        });
    }

    pub fn clear(&mut self) {
        *self = Session::Anonymous;
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.identity().is_some_and(|identity| identity.role == role)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Anonymous => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.identity().and_then(|identity| identity.token.as_deref())
    }

    /// Write the session keys, or remove them when anonymous.
    pub async fn save(&self, storage: &dyn Storage) -> AppResult<()> {
        let Some(identity) = self.identity() else {
            return storage.remove_many(&keys::SESSION).await;
        };

        let mut entries = vec![
            storage::entry(keys::ROLE, &identity.role)?,
            storage::entry(keys::CURRENT_USER_ID, &identity.user_id)?,
            storage::entry(keys::CURRENT_USER_EMAIL, &identity.email)?,
            storage::entry(keys::CURRENT_USER_NAME, &identity.name)?,
            storage::entry(keys::CURRENT_USER_MOBILE, &identity.mobile)?,
        ];
        match &identity.token {
            Some(token) => entries.push(storage::entry(keys::TOKEN, token)?),
            None => storage.remove_many(&[keys::TOKEN]).await?,
        }
        storage.put_many(entries).await
    }

    /// Rebuild a session from storage. Anything incomplete reads as anonymous.
    pub async fn restore(storage: &dyn Storage) -> AppResult<Self> {
        let role: Option<Role> = storage::load(storage, keys::ROLE).await?;
        let user_id: Option<i64> = storage::load(storage, keys::CURRENT_USER_ID).await?;
        let email: Option<String> = storage::load(storage, keys::CURRENT_USER_EMAIL).await?;

        let (Some(role), Some(user_id), Some(email)) = (role, user_id, email) else {
            return Ok(Session::Anonymous);
        };

        Ok(Session::Authenticated(Identity {
            token: storage::load(storage, keys::TOKEN).await?,
            role,
            user_id,
            email,
            name: storage::load(storage, keys::CURRENT_USER_NAME)
                .await?
                .unwrap_or_default(),
            mobile: storage::load(storage, keys::CURRENT_USER_MOBILE)
                .await?
                .unwrap_or_default(),
        }))
    }
}
