use crate::{
    auth::SessionKeys,
    axum_http::{
        default_routers,
        middlewares::{AdminIpAllowList, restrict_admin_ips, security_headers},
        routers,
        views::Views,
    },
    config::config_model::DotEnvyConfig,
    usecases::site_configs::{SharedSiteConfigs, SiteConfigUseCase},
};
use anyhow::Result;
use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    routing::get,
};
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad, repositories::site_configs::SiteConfigPostgres,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let admin_prefix = config.admin_area.url_prefix.clone();
    let production = config.stage.is_production();
    let body_limit: usize = (config.backend_server.body_limit * 1024 * 1024).try_into()?;

    let views = Arc::new(Views::new(&admin_prefix)?);
    let site_configs: SharedSiteConfigs = Arc::new(SiteConfigUseCase::new(Arc::new(
        SiteConfigPostgres::new(Arc::clone(&db_pool)),
    )));
    let session_keys = Arc::new(SessionKeys::new(
        &config.session.secret,
        config.session.ttl_minutes,
        production,
        &admin_prefix,
    ));
    let admin_ip_allow_list = Arc::new(AdminIpAllowList::new(
        &admin_prefix,
        config.admin_area.allowed_ips.clone(),
    ));

    let admin = Router::new()
        .merge(routers::admin_auth::routes(Arc::clone(&db_pool)))
        .merge(routers::admin_posts::routes(
            Arc::clone(&db_pool),
            Arc::clone(&config),
        ))
        .merge(routers::admin_plans::routes(Arc::clone(&db_pool)))
        .merge(routers::admin_site_configs::routes(Arc::clone(&db_pool)));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .merge(routers::public_pages::routes(
            Arc::clone(&db_pool),
            Arc::clone(&config),
        ))
        .nest(
            "/api",
            routers::api::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(&admin_prefix, admin)
        .route("/health", get(default_routers::health_check))
        .nest_service(
            "/static",
            ServeDir::new(&config.backend_server.static_dir),
        )
        // The allow-list renders its 403 page from the extensions below,
        // so it has to sit inside them.
        .layer(from_fn_with_state(admin_ip_allow_list, restrict_admin_ips))
        .layer(Extension(views))
        .layer(Extension(site_configs))
        .layer(Extension(session_keys))
        .layer(from_fn_with_state(production, security_headers))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET])
                .allow_headers([CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        stage = %config.stage,
        admin_prefix = %admin_prefix,
        "Server is running on port {}",
        config.backend_server.port
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
