use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::plans::{EditPlanEntity, InsertPlanEntity, PlanEntity};

#[async_trait]
#[automock]
pub trait PlanRepository {
    /// Active plans ordered by `display_order` ascending.
    async fn list_active(&self) -> Result<Vec<PlanEntity>>;

    async fn find_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>>;

    /// Largest `display_order` among active plans, used to append new plans.
    async fn max_display_order(&self) -> Result<Option<i32>>;

    async fn insert(&self, insert_plan_entity: InsertPlanEntity) -> Result<i64>;

    async fn update(&self, plan_id: i64, edit_plan_entity: EditPlanEntity) -> Result<bool>;

    async fn deactivate(&self, plan_id: i64) -> Result<bool>;
}
