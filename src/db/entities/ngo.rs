//! NGO entity - a food-receiving unit

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ngo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::donation_request::Entity")]
    DonationRequests,
}

impl Related<super::donation_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonationRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
