//! Food item entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "food")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub canteen_id: i32,
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit: String,
    pub expiry_time: i64,
    pub notes: Option<String>,
    pub status: String, // "available", "requested", "approved", "donated"
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::canteen::Entity",
        from = "Column::CanteenId",
        to = "super::canteen::Column::Id"
    )]
    Canteen,
    #[sea_orm(has_many = "super::donation_request::Entity")]
    DonationRequests,
    #[sea_orm(has_many = "super::waste_report::Entity")]
    WasteReports,
}

impl Related<super::canteen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Canteen.def()
    }
}

impl Related<super::donation_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonationRequests.def()
    }
}

impl Related<super::waste_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WasteReports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
