use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 计分方式
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub enum PointsStyle {
    #[default]
    StartAtZeroAndAdd,     // 从零开始累加
    StartAtMaxAndSubtract, // 从满分开始扣分
}

impl PointsStyle {
    pub const START_AT_ZERO_AND_ADD: &'static str = "start_at_zero_and_add";
    pub const START_AT_MAX_AND_SUBTRACT: &'static str = "start_at_max_and_subtract";
}

impl<'de> Deserialize<'de> for PointsStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的计分方式: '{s}'. 支持: start_at_zero_and_add, start_at_max_and_subtract"
            ))
        })
    }
}

impl std::fmt::Display for PointsStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointsStyle::StartAtZeroAndAdd => write!(f, "{}", PointsStyle::START_AT_ZERO_AND_ADD),
            PointsStyle::StartAtMaxAndSubtract => {
                write!(f, "{}", PointsStyle::START_AT_MAX_AND_SUBTRACT)
            }
        }
    }
}

impl std::str::FromStr for PointsStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PointsStyle::START_AT_ZERO_AND_ADD => Ok(PointsStyle::StartAtZeroAndAdd),
            PointsStyle::START_AT_MAX_AND_SUBTRACT => Ok(PointsStyle::StartAtMaxAndSubtract),
            _ => Err(format!("Invalid points style: {s}")),
        }
    }
}

// 评分细则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct HandgradingRubric {
    pub id: i64,
    pub project_id: i64,
    pub points_style: PointsStyle,
    // start_at_max_and_subtract 时必填
    pub max_points: Option<f64>,
    pub show_grades_and_rubric_to_students: bool,
    pub show_only_applied_rubric_to_students: bool,
    pub criteria: Vec<Criterion>,
    pub annotations: Vec<Annotation>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 评分项：选中即计入 points（可为负）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct Criterion {
    pub id: i64,
    pub rubric_id: i64,
    pub short_description: String,
    pub long_description: String,
    pub points: f64,
}

// 批注：每应用一次扣 deduction，累计扣分不低于 max_deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct Annotation {
    pub id: i64,
    pub rubric_id: i64,
    pub short_description: String,
    pub long_description: String,
    pub deduction: f64,
    pub max_deduction: Option<f64>,
}

// 代码位置（闭区间）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct Location {
    pub filename: String,
    pub first_line: i32,
    pub last_line: i32,
}

// 人工评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct HandgradingResult {
    pub id: i64,
    pub rubric_id: i64,
    pub group_id: i64,
    pub submission_id: i64,
    pub finished_grading: bool,
    pub points_adjustment: f64,
    pub criterion_results: Vec<CriterionResult>,
    pub applied_annotations: Vec<AppliedAnnotation>,
    pub comments: Vec<Comment>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct CriterionResult {
    pub id: i64,
    pub result_id: i64,
    pub criterion_id: i64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct AppliedAnnotation {
    pub id: i64,
    pub result_id: i64,
    pub annotation_id: i64,
    pub location: Location,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct Comment {
    pub id: i64,
    pub result_id: i64,
    pub location: Option<Location>,
    pub text: String,
}
