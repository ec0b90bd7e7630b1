//! Meal beneficiary entity - proof-of-impact for a completed donation

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meal_beneficiary")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub donation_id: i32,
    pub people_served: i64,
    pub location: String,
    pub recorded_time: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::donation_request::Entity",
        from = "Column::DonationId",
        to = "super::donation_request::Column::Id"
    )]
    DonationRequest,
}

impl Related<super::donation_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonationRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
