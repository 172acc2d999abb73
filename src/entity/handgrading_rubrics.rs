//! 评分细则实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;
use crate::errors::HWSystemError;
use crate::models::handgrading::entities::{Annotation, Criterion, HandgradingRubric};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "handgrading_rubrics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub project_id: i64,
    pub points_style: String,
    pub max_points: Option<f64>,
    pub show_grades_and_rubric_to_students: bool,
    pub show_only_applied_rubric_to_students: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 组装评分细则，评分项和批注需已按 sort_order 排序
    pub fn into_rubric(
        self,
        criteria: Vec<Criterion>,
        annotations: Vec<Annotation>,
    ) -> crate::errors::Result<HandgradingRubric> {
        Ok(HandgradingRubric {
            id: self.id,
            project_id: self.project_id,
            points_style: self
                .points_style
                .parse()
                .map_err(HWSystemError::serialization)?,
            max_points: self.max_points,
            show_grades_and_rubric_to_students: self.show_grades_and_rubric_to_students,
            show_only_applied_rubric_to_students: self.show_only_applied_rubric_to_students,
            criteria,
            annotations,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }
}
