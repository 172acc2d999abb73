use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::{HandgradingResult, HandgradingRubric};

/// 评分汇总（可缓存）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct HandgradingScoreSummary {
    pub result_id: i64,
    pub group_id: i64,
    pub submission_id: i64,
    pub finished_grading: bool,
    pub total_points: f64,
    pub total_points_possible: f64,
}

/// 人工评分结果详情（按查看者过滤后）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/handgrading.ts")]
pub struct HandgradingResultResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub result: HandgradingResult,
    pub handgrading_rubric: HandgradingRubric,
    pub total_points: f64,
    pub total_points_possible: f64,
}
