use std::sync::Arc;

use axum::{
    Extension, Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use crates::{
    domain::repositories::site_configs::SiteConfigRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::site_configs::SiteConfigPostgres,
    },
};
use tera::Context;
use tracing::info;

use crate::{
    auth::{AdminSession, SessionKeys},
    axum_http::{
        flash::{self, FlashMessage},
        views::PageContext,
    },
    usecases::site_configs::SiteConfigUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let site_config_repository = SiteConfigPostgres::new(Arc::clone(&db_pool));
    router(Arc::new(SiteConfigUseCase::new(Arc::new(
        site_config_repository,
    ))))
}

pub fn router<C>(usecase: Arc<SiteConfigUseCase<C>>) -> Router
where
    C: SiteConfigRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/settings", get(settings_page::<C>).post(save_settings::<C>))
        .with_state(usecase)
}

pub async fn settings_page<C>(
    State(usecase): State<Arc<SiteConfigUseCase<C>>>,
    AdminSession(_): AdminSession,
    page: PageContext,
) -> Response
where
    C: SiteConfigRepository + Send + Sync + 'static,
{
    match usecase.list_entries().await {
        Ok(entries) => {
            let mut context = Context::new();
            context.insert("entries", &entries);
            page.render("admin/settings.html", context)
        }
        Err(err) => page.error_page(err.status_code()),
    }
}

/// Every submitted field is a configuration key; blank values are ignored.
pub async fn save_settings<C>(
    State(usecase): State<Arc<SiteConfigUseCase<C>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    jar: CookieJar,
    Form(submitted): Form<Vec<(String, String)>>,
) -> Response
where
    C: SiteConfigRepository + Send + Sync + 'static,
{
    let message = match usecase.update_values(submitted).await {
        Ok(written) => {
            info!(admin_id = admin.id, written, "admin_site_configs: settings saved");
            FlashMessage::success("Settings updated successfully!")
        }
        Err(_) => FlashMessage::error("Could not update the settings."),
    };

    let jar = flash::store(jar, vec![message]);
    (
        jar,
        Redirect::to(&format!("{}/settings", keys.admin_prefix())),
    )
        .into_response()
}
