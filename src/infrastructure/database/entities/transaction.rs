//! Toll transaction entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub enrolment_no_date: String,

    /// Legacy REAL column, kept in sync with `amount_exact`
    #[sea_orm(nullable, column_type = "Double")]
    pub total_amount_charged: Option<f64>,

    /// Legacy REAL column, kept in sync with `gst_exact`
    #[sea_orm(nullable, column_type = "Double")]
    pub gst_amount: Option<f64>,

    #[sea_orm(nullable)]
    pub operator_id: Option<String>,

    #[sea_orm(nullable)]
    pub resident_name: Option<String>,

    /// Batch date as `YYYY-MM-DD`
    #[sea_orm(nullable)]
    pub upload_date: Option<String>,

    /// Amount charged as canonical decimal text
    #[sea_orm(column_type = "Text")]
    pub amount_exact: String,

    /// GST as canonical decimal text
    #[sea_orm(column_type = "Text")]
    pub gst_exact: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
