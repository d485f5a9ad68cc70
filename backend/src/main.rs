use anyhow::Result;
use backend::{
    axum_http::http_serve,
    config::config_loader,
    usecases::{admin_auth::AdminAuthUseCase, site_configs::SiteConfigUseCase},
};
use crates::infra::db::{
    postgres::postgres_connection,
    repositories::{admin_users::AdminUserPostgres, site_configs::SiteConfigPostgres},
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    dotenvy_env.validate()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = Arc::new(postgres_connection::establish_connection(
        &dotenvy_env.database.url,
    )?);
    info!("Postgres connection has been established");

    let site_configs = SiteConfigUseCase::new(Arc::new(SiteConfigPostgres::new(Arc::clone(
        &postgres_pool,
    ))));
    if let Err(err) = site_configs.seed_defaults().await {
        warn!(error = %err, "Default site configuration could not be seeded");
    }

    if let Some(bootstrap) = &dotenvy_env.bootstrap_admin {
        let admin_auth =
            AdminAuthUseCase::new(Arc::new(AdminUserPostgres::new(Arc::clone(&postgres_pool))));
        match admin_auth
            .ensure_bootstrap_admin(&bootstrap.username, &bootstrap.email, &bootstrap.password)
            .await
        {
            Ok(true) => info!(username = %bootstrap.username, "Bootstrap admin account created"),
            Ok(false) => info!("Admin accounts already exist, bootstrap skipped"),
            Err(err) => warn!(error = %err, "Bootstrap admin account could not be created"),
        }
    }

    http_serve::start(Arc::new(dotenvy_env), postgres_pool).await?;

    Ok(())
}
