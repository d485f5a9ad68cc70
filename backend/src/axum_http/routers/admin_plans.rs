use std::sync::Arc;

use axum::{
    Extension, Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use crates::{
    domain::{
        entities::plans::PlanEntity, repositories::plans::PlanRepository,
        value_objects::plans::PlanFormModel,
    },
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::plans::PlanPostgres},
};
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::{error, info};

use crate::{
    auth::{AdminSession, SessionKeys},
    axum_http::{
        flash::{self, FlashMessage},
        views::PageContext,
    },
    usecases::plans::{PlanError, PlanUseCase},
};

/// Raw plan form. The `recommended` checkbox is only sent when ticked.
#[derive(Debug, Deserialize)]
pub struct PlanPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    speed: String,
    #[serde(default)]
    features: String,
    recommended: Option<String>,
    #[serde(default)]
    display_order: String,
}

impl PlanPayload {
    fn into_form(self) -> Result<PlanFormModel, String> {
        let display_order = match self.display_order.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i32>()
                    .map_err(|_| "Display order must be a whole number.".to_string())?,
            ),
        };

        Ok(PlanFormModel {
            name: self.name,
            price: self.price,
            speed: self.speed,
            features: self.features,
            recommended: self.recommended.is_some(),
            display_order,
        })
    }
}

/// Values shown in the admin plan list and form.
#[derive(Debug, Default, Serialize)]
pub struct PlanFormView {
    pub id: Option<i64>,
    pub name: String,
    pub price: String,
    pub speed: String,
    pub features: String,
    pub recommended: bool,
    pub display_order: Option<i32>,
}

impl From<PlanEntity> for PlanFormView {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: Some(value.id),
            name: value.name,
            price: value.price,
            speed: value.speed,
            features: value.features,
            recommended: value.is_recommended,
            display_order: Some(value.display_order),
        }
    }
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    router(Arc::new(PlanUseCase::new(Arc::new(plan_repository))))
}

pub fn router<P>(usecase: Arc<PlanUseCase<P>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/plans", get(list_plans::<P>))
        .route("/plans/add", get(new_plan_form).post(create_plan::<P>))
        .route(
            "/plans/:plan_id/edit",
            get(edit_plan_form::<P>).post(update_plan::<P>),
        )
        .route("/plans/:plan_id/delete", post(delete_plan::<P>))
        .with_state(usecase)
}

fn list_path(keys: &SessionKeys) -> String {
    format!("{}/plans", keys.admin_prefix())
}

fn add_path(keys: &SessionKeys) -> String {
    format!("{}/plans/add", keys.admin_prefix())
}

fn edit_path(keys: &SessionKeys, plan_id: i64) -> String {
    format!("{}/plans/{plan_id}/edit", keys.admin_prefix())
}

fn error_flash(err: &PlanError, action: &str) -> FlashMessage {
    match err {
        PlanError::Validation(message) => FlashMessage::error(message.clone()),
        PlanError::NotFound => FlashMessage::error("Plan not found."),
        PlanError::Internal(_) => FlashMessage::error(format!("Could not {action} the plan.")),
    }
}

fn redirect_with(jar: CookieJar, message: FlashMessage, path: &str) -> Response {
    (flash::store(jar, vec![message]), Redirect::to(path)).into_response()
}

pub async fn list_plans<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    AdminSession(admin): AdminSession,
    page: PageContext,
) -> Response
where
    P: PlanRepository + Send + Sync + 'static,
{
    info!(admin_id = admin.id, "admin_plans: list request received");
    match usecase.list_active_entities().await {
        Ok(plans) => {
            let plans: Vec<PlanFormView> = plans.into_iter().map(PlanFormView::from).collect();
            let mut context = Context::new();
            context.insert("plans", &plans);
            page.render("admin/plans.html", context)
        }
        Err(err) => page.error_page(err.status_code()),
    }
}

pub async fn new_plan_form(AdminSession(_): AdminSession, page: PageContext) -> Response {
    let mut context = Context::new();
    context.insert("plan", &PlanFormView::default());
    page.render("admin/plan_form.html", context)
}

pub async fn create_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    jar: CookieJar,
    Form(payload): Form<PlanPayload>,
) -> Response
where
    P: PlanRepository + Send + Sync + 'static,
{
    let form = match payload.into_form() {
        Ok(form) => form,
        Err(message) => return redirect_with(jar, FlashMessage::error(message), &add_path(&keys)),
    };

    match usecase.create(form).await {
        Ok((plan_id, name)) => {
            info!(admin_id = admin.id, plan_id, "admin_plans: plan created");
            redirect_with(
                jar,
                FlashMessage::success(format!("Plan \"{name}\" added successfully!")),
                &list_path(&keys),
            )
        }
        Err(err) => redirect_with(jar, error_flash(&err, "add"), &add_path(&keys)),
    }
}

pub async fn edit_plan_form<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    AdminSession(_): AdminSession,
    Path(plan_id): Path<i64>,
    page: PageContext,
) -> Response
where
    P: PlanRepository + Send + Sync + 'static,
{
    match usecase.find_by_id(plan_id).await {
        Ok(plan) => {
            let mut context = Context::new();
            context.insert("plan", &PlanFormView::from(plan));
            page.render("admin/plan_form.html", context)
        }
        Err(err) => page.error_page(err.status_code()),
    }
}

pub async fn update_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    Path(plan_id): Path<i64>,
    jar: CookieJar,
    Form(payload): Form<PlanPayload>,
) -> Response
where
    P: PlanRepository + Send + Sync + 'static,
{
    let form = match payload.into_form() {
        Ok(form) => form,
        Err(message) => {
            return redirect_with(jar, FlashMessage::error(message), &edit_path(&keys, plan_id));
        }
    };

    match usecase.update(plan_id, form).await {
        Ok(_) => {
            info!(admin_id = admin.id, plan_id, "admin_plans: plan updated");
            redirect_with(
                jar,
                FlashMessage::success("Plan updated successfully!"),
                &list_path(&keys),
            )
        }
        Err(err @ PlanError::NotFound) => {
            redirect_with(jar, error_flash(&err, "update"), &list_path(&keys))
        }
        Err(err) => redirect_with(jar, error_flash(&err, "update"), &edit_path(&keys, plan_id)),
    }
}

pub async fn delete_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    Path(plan_id): Path<i64>,
    jar: CookieJar,
) -> Response
where
    P: PlanRepository + Send + Sync + 'static,
{
    let message = match usecase.deactivate(plan_id).await {
        Ok(name) => {
            info!(admin_id = admin.id, plan_id, "admin_plans: plan removed");
            FlashMessage::success(format!("Plan \"{name}\" removed successfully!"))
        }
        Err(err) => {
            error!(admin_id = admin.id, plan_id, error = %err, "admin_plans: failed to remove plan");
            error_flash(&err, "remove")
        }
    };

    redirect_with(jar, message, &list_path(&keys))
}
