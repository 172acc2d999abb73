//! 提交实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub group_id: i64,
    #[sea_orm(column_type = "Text")]
    pub submitted_filenames: String,
    pub submitted_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id"
    )]
    Group,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission(self) -> crate::errors::Result<crate::models::groups::entities::Submission> {
        use crate::models::groups::entities::Submission;

        Ok(Submission {
            id: self.id,
            group_id: self.group_id,
            submitted_filenames: serde_json::from_str(&self.submitted_filenames)?,
            submitted_at: timestamp_to_datetime(self.submitted_at),
        })
    }
}
