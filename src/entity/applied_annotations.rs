//! 已应用批注实体

use sea_orm::entity::prelude::*;

use crate::models::handgrading::entities::{AppliedAnnotation, Location};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "applied_annotations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub result_id: i64,
    pub annotation_id: i64,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub filename: String,
    pub first_line: i32,
    pub last_line: i32,
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
    #[sea_orm(
        belongs_to = "super::annotations::Entity",
        from = "Column::AnnotationId",
        to = "super::annotations::Column::Id",
        on_delete = "Cascade"
    )]
    Annotation,
}

impl Related<super::handgrading_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Result.def()
    }
}

impl Related<super::annotations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Annotation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_applied_annotation(self) -> AppliedAnnotation {
        AppliedAnnotation {
            id: self.id,
            result_id: self.result_id,
            annotation_id: self.annotation_id,
            location: Location {
                filename: self.filename,
                first_line: self.first_line,
                last_line: self.last_line,
            },
            comment: self.comment,
        }
    }
}
