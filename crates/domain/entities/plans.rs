use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::plans;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq, Eq)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: i64,
    pub name: String,
    pub price: String, // display string, e.g. "99,90"
    pub speed: String,
    pub features: String, // one feature per line
    pub is_recommended: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq, Eq)]
#[diesel(table_name = plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub price: String,
    pub speed: String,
    pub features: String,
    pub is_recommended: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset, PartialEq, Eq)]
#[diesel(table_name = plans)]
pub struct EditPlanEntity {
    pub name: String,
    pub price: String,
    pub speed: String,
    pub features: String,
    pub is_recommended: bool,
    pub display_order: Option<i32>,
}
