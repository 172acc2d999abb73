//! 小组实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    #[sea_orm(column_type = "Text")]
    pub member_names: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_group(self) -> crate::errors::Result<crate::models::groups::entities::Group> {
        use crate::models::groups::entities::Group;

        Ok(Group {
            id: self.id,
            project_id: self.project_id,
            member_names: serde_json::from_str(&self.member_names)?,
            created_at: timestamp_to_datetime(self.created_at),
        })
    }
}
