use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "week_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub week_number: i32,
    pub weekly_cap: i64,
    pub curse_power: i64,
    pub shield_power: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
