//! Leaderboard entity - per-canteen waste-reduction counters

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "leaderboard")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub canteen_id: i32,
    /// Cumulative quantity of items ever listed.
    pub total_items: i64,
    /// Cumulative quantity donated through completed requests.
    pub donated_items: i64,
    /// Donated percentage, recomputed with every counter update.
    pub waste_score: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::canteen::Entity",
        from = "Column::CanteenId",
        to = "super::canteen::Column::Id"
    )]
    Canteen,
}

impl Related<super::canteen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Canteen.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
