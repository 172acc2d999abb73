use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 返回给前端的已解锁提示（变异体名可能已混淆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct UnlockedHintResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub mutation_test_suite_result_id: i64,
    pub hint_config_id: i64,
    pub mutant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_mutant_name: Option<String>,
    pub hint_number: i32,
    pub hint_text: String,
    pub hint_rating: Option<i32>,
    pub user_comment: String,
}

/// 未发放提示的原因（不是错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub enum NoHintReason {
    AllBugsDetected,
    HintsExhausted,
}

/// 解锁请求的结果
#[derive(Debug, Clone, PartialEq)]
pub enum HintUnlockOutcome {
    Unlocked(UnlockedHintResponse),
    NoContent(NoHintReason),
}

/// 当前变异体剩余未解锁的提示数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct NumHintsRemainingResponse {
    pub num_hints_remaining: i64,
    pub mutant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_mutant_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct HintCounts {
    pub submission: i64,
    pub today: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct HintAllowance {
    pub submission: Option<i32>,
    pub today: Option<i32>,
}

/// 提示额度使用情况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct HintLimitsResponse {
    pub num_hints_unlocked: HintCounts,
    pub num_hints_allowed: HintAllowance,
}

/// 小组当日提示额度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct DailyHintLimitResponse {
    pub num_hints_unlocked_today: i64,
    pub num_hints_per_day: Option<i32>,
}
