use serde::Deserialize;
use ts_rs::TS;

use super::entities::{Location, PointsStyle};
use crate::models::deserialize_some;

/// 创建评分细则请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct CreateRubricRequest {
    pub project_id: i64,
    #[serde(default)]
    pub points_style: PointsStyle,
    pub max_points: Option<f64>,
    #[serde(default)]
    pub show_grades_and_rubric_to_students: bool,
    #[serde(default)]
    pub show_only_applied_rubric_to_students: bool,
}

/// 更新评分细则请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct UpdateRubricRequest {
    pub points_style: Option<PointsStyle>,
    /// `Some(None)` 清除满分
    #[serde(default, deserialize_with = "deserialize_some")]
    #[ts(type = "number | null")]
    pub max_points: Option<Option<f64>>,
    pub show_grades_and_rubric_to_students: Option<bool>,
    pub show_only_applied_rubric_to_students: Option<bool>,
}

/// 添加评分项请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct CreateCriterionRequest {
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub points: f64,
}

/// 更新评分项请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct UpdateCriterionRequest {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub points: Option<f64>,
}

/// 添加批注请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct CreateAnnotationRequest {
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub deduction: f64,
    pub max_deduction: Option<f64>,
}

/// 更新批注请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct UpdateAnnotationRequest {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub deduction: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[ts(type = "number | null")]
    pub max_deduction: Option<Option<f64>>,
}

/// 创建人工评分结果请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct CreateHandgradingResultRequest {
    pub rubric_id: i64,
    pub group_id: i64,
    pub submission_id: i64,
}

/// 更新人工评分结果请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct UpdateHandgradingResultRequest {
    pub points_adjustment: Option<f64>,
    pub finished_grading: Option<bool>,
}

/// 应用批注请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct ApplyAnnotationRequest {
    pub annotation_id: i64,
    pub location: Location,
    #[serde(default)]
    pub comment: String,
}

/// 添加评语请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct CreateCommentRequest {
    pub location: Option<Location>,
    pub text: String,
}

/// 修改评语请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct UpdateCommentRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    #[ts(type = "Location | null")]
    pub location: Option<Option<Location>>,
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rubric_max_points_missing_vs_null() {
        let missing: UpdateRubricRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.max_points, None);

        let cleared: UpdateRubricRequest = serde_json::from_str(r#"{"max_points": null}"#).unwrap();
        assert_eq!(cleared.max_points, Some(None));

        let set: UpdateRubricRequest = serde_json::from_str(r#"{"max_points": 12.5}"#).unwrap();
        assert_eq!(set.max_points, Some(Some(12.5)));
    }

    #[test]
    fn test_update_comment_location_cleared() {
        let req: UpdateCommentRequest = serde_json::from_str(r#"{"location": null}"#).unwrap();
        assert_eq!(req.location, Some(None));
        assert_eq!(req.text, None);
    }
}
