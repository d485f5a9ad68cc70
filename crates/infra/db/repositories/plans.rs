use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, dsl::max, prelude::*, update};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::{
        entities::plans::{EditPlanEntity, InsertPlanEntity, PlanEntity},
        repositories::plans::PlanRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::plans},
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn list_active(&self) -> Result<Vec<PlanEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<PlanEntity>> {
            let mut conn = db_pool.get()?;

            let rows = plans::table
                .filter(plans::is_active.eq(true))
                .order((plans::display_order.asc(), plans::id.asc()))
                .select(PlanEntity::as_select())
                .load::<PlanEntity>(&mut conn)?;

            Ok(rows)
        })
        .await?
    }

    async fn find_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PlanEntity>> {
            let mut conn = db_pool.get()?;

            let row = plans::table
                .find(plan_id)
                .select(PlanEntity::as_select())
                .first::<PlanEntity>(&mut conn)
                .optional()?;

            Ok(row)
        })
        .await?
    }

    async fn max_display_order(&self) -> Result<Option<i32>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<i32>> {
            let mut conn = db_pool.get()?;

            let highest = plans::table
                .filter(plans::is_active.eq(true))
                .select(max(plans::display_order))
                .first::<Option<i32>>(&mut conn)?;

            Ok(highest)
        })
        .await?
    }

    async fn insert(&self, insert_plan_entity: InsertPlanEntity) -> Result<i64> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<i64> {
            let mut conn = db_pool.get()?;

            let plan_id = diesel::insert_into(plans::table)
                .values(&insert_plan_entity)
                .returning(plans::id)
                .get_result::<i64>(&mut conn)?;

            Ok(plan_id)
        })
        .await?
    }

    async fn update(&self, plan_id: i64, edit_plan_entity: EditPlanEntity) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let affected = update(plans::table.find(plan_id))
                .set(&edit_plan_entity)
                .execute(&mut conn)?;

            Ok(affected > 0)
        })
        .await?
    }

    async fn deactivate(&self, plan_id: i64) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let affected = update(plans::table.find(plan_id))
                .set(plans::is_active.eq(false))
                .execute(&mut conn)?;

            Ok(affected > 0)
        })
        .await?
    }
}
