//! 评语实体

use sea_orm::entity::prelude::*;

use crate::models::handgrading::entities::{Comment, Location};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub result_id: i64,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub filename: Option<String>,
    pub first_line: Option<i32>,
    pub last_line: Option<i32>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::handgrading_results::Entity",
        from = "Column::ResultId",
        to = "super::handgrading_results::Column::Id",
        on_delete = "Cascade"
    )]
    Result,
}

impl Related<super::handgrading_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Result.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_comment(self) -> Comment {
        // 三个位置字段要么同时存在，要么同时为空
        let location = match (self.filename, self.first_line, self.last_line) {
            (Some(filename), Some(first_line), Some(last_line)) => Some(Location {
                filename,
                first_line,
                last_line,
            }),
            _ => None,
        };

        Comment {
            id: self.id,
            result_id: self.result_id,
            location,
            text: self.text,
        }
    }
}
