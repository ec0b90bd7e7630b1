//! Waste report entity - immutable record of discarded quantity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "waste_report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub food_id: i32,
    pub reported_by: i32,
    pub reason: String,
    pub quantity_wasted: i64,
    pub report_time: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::food::Entity",
        from = "Column::FoodId",
        to = "super::food::Column::Id"
    )]
    Food,
}

impl Related<super::food::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Food.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
