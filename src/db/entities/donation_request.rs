//! Donation request entity - an NGO's claim on a food item

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "donation_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub food_id: i32,
    pub ngo_id: i32,
    pub status: String, // "pending", "approved", "rejected", "completed"
    pub request_time: i64,
    pub approved_by: Option<i32>,
    pub approved_time: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::food::Entity",
        from = "Column::FoodId",
        to = "super::food::Column::Id"
    )]
    Food,
    #[sea_orm(
        belongs_to = "super::ngo::Entity",
        from = "Column::NgoId",
        to = "super::ngo::Column::Id"
    )]
    Ngo,
    #[sea_orm(has_many = "super::meal_beneficiary::Entity")]
    Beneficiaries,
}

impl Related<super::food::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Food.def()
    }
}

impl Related<super::ngo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ngo.def()
    }
}

impl Related<super::meal_beneficiary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beneficiaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
