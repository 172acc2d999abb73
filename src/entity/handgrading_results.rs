//! 人工评分结果实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;
use crate::models::handgrading::entities::{
    AppliedAnnotation, Comment, CriterionResult, HandgradingResult,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "handgrading_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub rubric_id: i64,
    #[sea_orm(unique)]
    pub group_id: i64,
    #[sea_orm(unique)]
    pub submission_id: i64,
    pub points_adjustment: f64,
    pub finished_grading: bool,
    pub created_at: i64,
    pub updated_at: i64,
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
    pub fn into_result(
        self,
        criterion_results: Vec<CriterionResult>,
        applied_annotations: Vec<AppliedAnnotation>,
        comments: Vec<Comment>,
    ) -> HandgradingResult {
        HandgradingResult {
            id: self.id,
            rubric_id: self.rubric_id,
            group_id: self.group_id,
            submission_id: self.submission_id,
            finished_grading: self.finished_grading,
            points_adjustment: self.points_adjustment,
            criterion_results,
            applied_annotations,
            comments,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}
