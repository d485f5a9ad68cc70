use std::sync::Arc;

use axum::{
    Extension, Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use crates::{
    domain::repositories::admin_users::AdminUserRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::admin_users::AdminUserPostgres,
    },
};
use serde::Deserialize;
use tera::Context;
use tracing::{error, info};

use crate::{
    auth::{AdminSession, SESSION_COOKIE, SessionKeys},
    axum_http::{
        flash::{self, FlashMessage},
        views::PageContext,
    },
    usecases::admin_auth::{AdminAuthError, AdminAuthUseCase},
};

const LOGIN_FAILED: &str = "Invalid username or password.";
const LOGIN_UNAVAILABLE: &str = "Login is unavailable right now. Please try again.";

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let admin_user_repository = AdminUserPostgres::new(Arc::clone(&db_pool));
    router(Arc::new(AdminAuthUseCase::new(Arc::new(
        admin_user_repository,
    ))))
}

pub fn router<A>(usecase: Arc<AdminAuthUseCase<A>>) -> Router
where
    A: AdminUserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(dashboard))
        .route("/login", get(login_page).post(login::<A>))
        .route("/logout", get(logout))
        .with_state(usecase)
}

fn landing_path(keys: &SessionKeys) -> String {
    format!("{}/plans", keys.admin_prefix())
}

pub async fn dashboard(
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(_): AdminSession,
) -> impl IntoResponse {
    Redirect::to(&landing_path(&keys))
}

pub async fn login_page(
    Extension(keys): Extension<Arc<SessionKeys>>,
    jar: CookieJar,
    page: PageContext,
) -> Response {
    let already_signed_in = jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| keys.validate_token(cookie.value()).is_ok());
    if already_signed_in {
        return Redirect::to(&landing_path(&keys)).into_response();
    }

    page.render("admin/login.html", Context::new())
}

pub async fn login<A>(
    State(usecase): State<Arc<AdminAuthUseCase<A>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    jar: CookieJar,
    Form(payload): Form<LoginPayload>,
) -> Response
where
    A: AdminUserRepository + Send + Sync + 'static,
{
    let message = match usecase.login(&payload.username, &payload.password).await {
        Ok(identity) => match keys.issue_token(&identity, Utc::now()) {
            Ok(token) => {
                info!(admin_id = identity.id, "admin_auth: session issued");
                let jar = flash::store(
                    jar.add(keys.session_cookie(token)),
                    vec![FlashMessage::success("Signed in successfully.")],
                );
                return (jar, Redirect::to(&landing_path(&keys))).into_response();
            }
            Err(err) => {
                error!(admin_id = identity.id, error = ?err, "admin_auth: failed to issue session");
                LOGIN_UNAVAILABLE.to_string()
            }
        },
        Err(AdminAuthError::InvalidCredentials) | Err(AdminAuthError::Validation(_)) => {
            LOGIN_FAILED.to_string()
        }
        Err(err @ AdminAuthError::AccountLocked { .. }) => err.to_string(),
        Err(AdminAuthError::Internal(_)) => LOGIN_UNAVAILABLE.to_string(),
    };

    let jar = flash::store(jar, vec![FlashMessage::error(message)]);
    (jar, Redirect::to(&keys.login_path())).into_response()
}

pub async fn logout(Extension(keys): Extension<Arc<SessionKeys>>, jar: CookieJar) -> Response {
    let jar = flash::store(
        jar.remove(keys.removal_cookie()),
        vec![FlashMessage::info("You have signed out.")],
    );
    (jar, Redirect::to(&keys.login_path())).into_response()
}
