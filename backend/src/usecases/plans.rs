use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::plans::{EditPlanEntity, InsertPlanEntity, PlanEntity},
    repositories::plans::PlanRepository,
    value_objects::{
        html_sanitizer::clean_text_field,
        plans::{PlanDto, PlanFormModel},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{0}")]
    Validation(String),
    #[error("plan not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlanError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PlanError::Validation(_) => StatusCode::BAD_REQUEST,
            PlanError::NotFound => StatusCode::NOT_FOUND,
            PlanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PlanError>;

/// Cleaned plan fields ready to be written.
struct CleanPlanForm {
    name: String,
    price: String,
    speed: String,
    features: String,
    recommended: bool,
    display_order: Option<i32>,
}

fn clean_form(form: PlanFormModel) -> UseCaseResult<CleanPlanForm> {
    let cleaned = CleanPlanForm {
        name: clean_text_field(form.name.trim()),
        price: clean_text_field(form.price.trim()),
        speed: clean_text_field(form.speed.trim()),
        features: clean_text_field(form.features.trim()),
        recommended: form.recommended,
        display_order: form.display_order,
    };

    let missing: Vec<&str> = [("name", &cleaned.name), ("price", &cleaned.price)]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

    if !missing.is_empty() {
        return Err(PlanError::Validation(format!(
            "Required fields are missing: {}",
            missing.join(", ")
        )));
    }

    Ok(cleaned)
}

pub struct PlanUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repository: Arc<P>,
}

impl<P> PlanUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repository: Arc<P>) -> Self {
        Self { plan_repository }
    }

    pub async fn list_active(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.list_active_entities().await?;
        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn list_active_entities(&self) -> UseCaseResult<Vec<PlanEntity>> {
        let plans = self.plan_repository.list_active().await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to list active plans");
            PlanError::Internal(err)
        })?;

        info!(plan_count = plans.len(), "plans: active plans loaded");
        Ok(plans)
    }

    pub async fn find_by_id(&self, plan_id: i64) -> UseCaseResult<PlanEntity> {
        self.plan_repository
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to load plan");
                PlanError::Internal(err)
            })?
            .ok_or(PlanError::NotFound)
    }

    /// Creates a plan; without an explicit display order it goes after the
    /// last active plan.
    pub async fn create(&self, form: PlanFormModel) -> UseCaseResult<(i64, String)> {
        let form = clean_form(form)?;

        let display_order = match form.display_order {
            Some(order) => order,
            None => {
                let highest = self
                    .plan_repository
                    .max_display_order()
                    .await
                    .map_err(|err| {
                        error!(db_error = ?err, "plans: failed to read display order");
                        PlanError::Internal(err)
                    })?;
                highest.map_or(0, |order| order.saturating_add(1))
            }
        };

        let insert_plan_entity = InsertPlanEntity {
            name: form.name.clone(),
            price: form.price,
            speed: form.speed,
            features: form.features,
            is_recommended: form.recommended,
            display_order,
            is_active: true,
            created_at: Utc::now(),
        };

        let plan_id = self
            .plan_repository
            .insert(insert_plan_entity)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plans: failed to insert plan");
                PlanError::Internal(err)
            })?;

        info!(plan_id, display_order, "plans: plan created");
        Ok((plan_id, form.name))
    }

    pub async fn update(&self, plan_id: i64, form: PlanFormModel) -> UseCaseResult<String> {
        let form = clean_form(form)?;

        let edit_plan_entity = EditPlanEntity {
            name: form.name.clone(),
            price: form.price,
            speed: form.speed,
            features: form.features,
            is_recommended: form.recommended,
            display_order: form.display_order,
        };

        let updated = self
            .plan_repository
            .update(plan_id, edit_plan_entity)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to update plan");
                PlanError::Internal(err)
            })?;

        if !updated {
            warn!(plan_id, "plans: update target not found");
            return Err(PlanError::NotFound);
        }

        info!(plan_id, "plans: plan updated");
        Ok(form.name)
    }

    /// Soft delete; the row stays addressable by id.
    pub async fn deactivate(&self, plan_id: i64) -> UseCaseResult<String> {
        let plan = self.find_by_id(plan_id).await?;

        let deactivated = self
            .plan_repository
            .deactivate(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to deactivate plan");
                PlanError::Internal(err)
            })?;

        if !deactivated {
            return Err(PlanError::NotFound);
        }

        info!(plan_id, "plans: plan deactivated");
        Ok(plan.name)
    }
}
