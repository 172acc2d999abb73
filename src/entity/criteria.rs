//! 评分项实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "criteria")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub rubric_id: i64,
    pub short_description: String,
    #[sea_orm(column_type = "Text")]
    pub long_description: String,
    pub points: f64,
    pub sort_order: i32,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::handgrading_rubrics::Entity",
        from = "Column::RubricId",
        to = "super::handgrading_rubrics::Column::Id",
        on_delete = "Cascade"
    )]
    Rubric,
}

impl Related<super::handgrading_rubrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rubric.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_criterion(self) -> crate::models::handgrading::entities::Criterion {
        crate::models::handgrading::entities::Criterion {
            id: self.id,
            rubric_id: self.rubric_id,
            short_description: self.short_description,
            long_description: self.long_description,
            points: self.points,
        }
    }
}
