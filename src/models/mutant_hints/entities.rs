use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 变异体名称混淆方式
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub enum MutantNameObfuscation {
    #[default]
    None, // 不混淆
    Sequential, // "前缀 N"，N 为套件中的序号（从 1 开始）
    Hash,       // "前缀 哈希"，对每个小组稳定且互不相同
}

impl MutantNameObfuscation {
    pub const NONE: &'static str = "none";
    pub const SEQUENTIAL: &'static str = "sequential";
    pub const HASH: &'static str = "hash";
}

impl<'de> Deserialize<'de> for MutantNameObfuscation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的混淆方式: '{s}'. 支持: none, sequential, hash"
            ))
        })
    }
}

impl std::fmt::Display for MutantNameObfuscation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutantNameObfuscation::None => write!(f, "{}", MutantNameObfuscation::NONE),
            MutantNameObfuscation::Sequential => {
                write!(f, "{}", MutantNameObfuscation::SEQUENTIAL)
            }
            MutantNameObfuscation::Hash => write!(f, "{}", MutantNameObfuscation::HASH),
        }
    }
}

impl std::str::FromStr for MutantNameObfuscation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            MutantNameObfuscation::NONE => Ok(MutantNameObfuscation::None),
            MutantNameObfuscation::SEQUENTIAL => Ok(MutantNameObfuscation::Sequential),
            MutantNameObfuscation::HASH => Ok(MutantNameObfuscation::Hash),
            _ => Err(format!("Invalid mutant name obfuscation: {s}")),
        }
    }
}

// 变异测试套件
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct MutationTestSuite {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    // 顺序即优先级：第一个未检出的变异体决定提示内容
    pub buggy_impl_names: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MutationTestSuite {
    /// 按 `buggy_impl_names` 的顺序返回第一个未被检出的变异体
    pub fn first_undetected_mutant(&self, bugs_exposed: &[String]) -> Option<&str> {
        self.buggy_impl_names
            .iter()
            .find(|name| !bugs_exposed.contains(name))
            .map(String::as_str)
    }
}

// 变异测试结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct MutationTestSuiteResult {
    pub id: i64,
    pub mutation_test_suite_id: i64,
    pub submission_id: i64,
    // 提交所属小组
    pub group_id: i64,
    pub bugs_exposed: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 套件提示配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct MutationTestSuiteHintConfig {
    pub id: i64,
    pub mutation_test_suite_id: i64,
    pub hints_by_mutant_name: HashMap<String, Vec<String>>,
    // None 表示不限
    pub num_hints_per_day: Option<i32>,
    pub num_hints_per_submission: Option<i32>,
    #[ts(type = "string")]
    pub hint_limit_reset_time: NaiveTime,
    pub hint_limit_reset_timezone: String,
    pub obfuscate_mutant_names: MutantNameObfuscation,
    pub obfuscated_mutant_name_prefix: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl MutationTestSuiteHintConfig {
    /// 某个变异体配置的全部提示，未配置时为空
    pub fn hints_for(&self, mutant_name: &str) -> &[String] {
        self.hints_by_mutant_name
            .get(mutant_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// 已解锁提示，hint_text 为解锁时的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/mutant_hints.ts")]
pub struct UnlockedHint {
    pub id: i64,
    pub mutation_test_suite_result_id: i64,
    pub hint_config_id: i64,
    pub mutant_name: String,
    pub hint_number: i32,
    pub hint_text: String,
    pub unlocked_by: String,
    pub hint_rating: Option<i32>,
    pub rated_by: String,
    pub user_comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
