use std::sync::Arc;

use catalog_admin_api::{
    config::{AdminSeed, AppConfig},
    services::seed_service,
    state::AppState,
    storage::{PgStorage, create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let pool = create_pool(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    let state = AppState::load(config.clone(), Arc::new(PgStorage::new(pool))).await?;

    let seed = config.admin_seed.clone().unwrap_or_else(|| AdminSeed {
        email: "admin@example.com".to_string(),
        password: "admin123".to_string(),
    });
    let admin_id = seed_service::ensure_admin(&state, &seed).await?;
    let categories = seed_service::ensure_default_categories(&state).await?;

    match admin_id {
        Some(id) => println!("Seed completed. Admin ID: {id}, categories added: {categories}"),
        None => println!("Seed completed. Admin {} already existed, categories added: {categories}", seed.email),
    }
    Ok(())
}
