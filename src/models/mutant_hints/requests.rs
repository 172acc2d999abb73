use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::MutantNameObfuscation;
use crate::models::deserialize_some;

/// 创建变异测试套件请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct CreateMutationTestSuiteRequest {
    pub project_id: i64,
    pub name: String,
    pub buggy_impl_names: Vec<String>,
}

/// 记录变异测试结果请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct CreateMutationTestSuiteResultRequest {
    pub mutation_test_suite_id: i64,
    pub submission_id: i64,
    #[serde(default)]
    pub bugs_exposed: Vec<String>,
}

/// 创建提示配置请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct CreateHintConfigRequest {
    #[serde(default)]
    pub hints_by_mutant_name: HashMap<String, Vec<String>>,
    pub num_hints_per_day: Option<i32>,
    pub num_hints_per_submission: Option<i32>,
    // "HH:MM" 或 "HH:MM:SS"
    pub hint_limit_reset_time: Option<String>,
    pub hint_limit_reset_timezone: Option<String>,
    pub obfuscate_mutant_names: Option<MutantNameObfuscation>,
    pub obfuscated_mutant_name_prefix: Option<String>,
}

/// 更新提示配置请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct UpdateHintConfigRequest {
    pub hints_by_mutant_name: Option<HashMap<String, Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[ts(type = "number | null")]
    pub num_hints_per_day: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[ts(type = "number | null")]
    pub num_hints_per_submission: Option<Option<i32>>,
    pub hint_limit_reset_time: Option<String>,
    pub hint_limit_reset_timezone: Option<String>,
    pub obfuscate_mutant_names: Option<MutantNameObfuscation>,
    pub obfuscated_mutant_name_prefix: Option<String>,
}

/// 评价提示请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct RateHintRequest {
    pub hint_rating: i32,
    pub user_comment: Option<String>,
}

// 用于存储层的已校验配置值
#[derive(Debug, Clone, PartialEq)]
pub struct HintConfigValues {
    pub hints_by_mutant_name: HashMap<String, Vec<String>>,
    pub num_hints_per_day: Option<i32>,
    pub num_hints_per_submission: Option<i32>,
    pub hint_limit_reset_time: NaiveTime,
    pub hint_limit_reset_timezone: String,
    pub obfuscate_mutant_names: MutantNameObfuscation,
    pub obfuscated_mutant_name_prefix: String,
}

// 用于存储层插入新的已解锁提示
#[derive(Debug, Clone)]
pub struct NewUnlockedHint {
    pub mutation_test_suite_result_id: i64,
    pub hint_config_id: i64,
    pub mutant_name: String,
    pub hint_number: i32,
    pub hint_text: String,
    pub unlocked_by: String,
    pub created_at: DateTime<Utc>,
}
