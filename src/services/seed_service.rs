use crate::{
    config::AdminSeed,
    error::AppResult,
    models::{Actor, Role},
    state::AppState,
};

pub const DEFAULT_CATEGORIES: [&str; 3] = ["Electronics", "Clothing", "Books"];

/// Create the configured admin account if it does not exist yet.
/// Returns the new admin's id, or `None` when the account was already there.
pub async fn ensure_admin(state: &AppState, seed: &AdminSeed) -> AppResult<Option<i64>> {
    let (email, password) = (seed.email.clone(), seed.password.clone());
    let created = state
        .mutate_credentials(move |credentials| {
            credentials.seed_admin("Admin", "0000000000", &email, &password)
        })
        .await?;

    match &created {
        Some(user) => tracing::info!(email = %user.email, "admin user created"),
        None => tracing::debug!(email = %seed.email, "admin user already present"),
    }
    Ok(created.map(|user| user.id))
}

/// Populate the starter categories when the catalog has none.
pub async fn ensure_default_categories(state: &AppState) -> AppResult<usize> {
    // Seeding runs outside any request, so it acts with admin rights.
    let actor = Actor::new(0, Role::Admin);
    let added = state
        .mutate_entities(|entities, _| {
            if !entities.list_categories().is_empty() {
                return Ok(0);
            }
            for name in DEFAULT_CATEGORIES {
                entities.add_category(&actor, name)?;
            }
            Ok(DEFAULT_CATEGORIES.len())
        })
        .await?;

    if added > 0 {
        tracing::info!(count = added, "default categories created");
    }
    Ok(added)
}
