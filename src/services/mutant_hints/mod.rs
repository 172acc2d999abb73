pub mod config;
pub mod limits;
pub mod list;
pub mod obfuscate;
pub mod rate;
pub mod unlock;
pub mod window;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::HintDefaults;
use crate::errors::{HWSystemError, Result};
use crate::models::mutant_hints::{
    entities::{
        MutationTestSuite, MutationTestSuiteHintConfig, MutationTestSuiteResult, UnlockedHint,
    },
    requests::{CreateHintConfigRequest, RateHintRequest, UpdateHintConfigRequest},
    responses::{
        DailyHintLimitResponse, HintLimitsResponse, HintUnlockOutcome, NumHintsRemainingResponse,
        UnlockedHintResponse,
    },
};
use crate::storage::Storage;

pub use obfuscate::obfuscate_mutant_name;
pub use window::hint_limit_window;

/// 启动时检查提示默认配置
pub fn validate_hint_defaults(defaults: &HintDefaults) -> Result<()> {
    window::parse_timezone(&defaults.default_reset_timezone).map_err(|_| {
        HWSystemError::configuration(format!(
            "hints.default_reset_timezone 不是有效的时区: {}",
            defaults.default_reset_timezone
        ))
    })?;
    Ok(())
}

pub struct HintService {
    storage: Arc<dyn Storage>,
    defaults: HintDefaults,
}

impl HintService {
    pub fn new(storage: Arc<dyn Storage>, defaults: HintDefaults) -> Self {
        Self { storage, defaults }
    }

    pub(crate) fn get_storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    pub(crate) fn get_defaults(&self) -> &HintDefaults {
        &self.defaults
    }

    // 创建提示配置
    pub async fn create_hint_config(
        &self,
        suite_id: i64,
        req: CreateHintConfigRequest,
    ) -> Result<MutationTestSuiteHintConfig> {
        config::create_hint_config(self, suite_id, req).await
    }

    // 获取套件的提示配置
    pub async fn get_hint_config(&self, suite_id: i64) -> Result<MutationTestSuiteHintConfig> {
        config::get_hint_config(self, suite_id).await
    }

    // 更新提示配置
    pub async fn update_hint_config(
        &self,
        config_id: i64,
        update: UpdateHintConfigRequest,
    ) -> Result<MutationTestSuiteHintConfig> {
        config::update_hint_config(self, config_id, update).await
    }

    // 删除提示配置
    pub async fn delete_hint_config(&self, config_id: i64) -> Result<()> {
        config::delete_hint_config(self, config_id).await
    }

    // 为套件运行结果解锁下一条提示
    pub async fn request_hint(
        &self,
        result_id: i64,
        actor: &str,
        include_true_mutant_name: bool,
    ) -> Result<HintUnlockOutcome> {
        unlock::request_hint(self, result_id, actor, include_true_mutant_name).await
    }

    // 同上，使用指定的当前时间
    pub async fn request_hint_at(
        &self,
        result_id: i64,
        actor: &str,
        include_true_mutant_name: bool,
        now: DateTime<Utc>,
    ) -> Result<HintUnlockOutcome> {
        unlock::request_hint_at(self, result_id, actor, include_true_mutant_name, now).await
    }

    // 某次提交已解锁的提示数
    pub async fn count_hints_for_submission(
        &self,
        suite_id: i64,
        submission_id: i64,
    ) -> Result<i64> {
        limits::count_hints_for_submission(self, suite_id, submission_id).await
    }

    // 小组在当前窗口内已解锁的提示数
    pub async fn count_hints_today(
        &self,
        group_id: i64,
        config: &MutationTestSuiteHintConfig,
    ) -> Result<i64> {
        limits::count_hints_today(self, group_id, config).await
    }

    // 当前变异体尚未解锁的提示数
    pub async fn count_locked_hints_remaining(
        &self,
        group_id: i64,
        config: &MutationTestSuiteHintConfig,
        mutant_name: &str,
    ) -> Result<i64> {
        limits::count_locked_hints_remaining(self, group_id, config, mutant_name).await
    }

    // 提交和当日的额度使用情况
    pub async fn hint_limits(&self, result_id: i64) -> Result<HintLimitsResponse> {
        limits::hint_limits(self, result_id).await
    }

    // 小组在某套件下的当日额度
    pub async fn daily_hint_limit(
        &self,
        group_id: i64,
        suite_id: i64,
    ) -> Result<DailyHintLimitResponse> {
        limits::daily_hint_limit(self, group_id, suite_id).await
    }

    // 剩余提示数，全部检出时为 None
    pub async fn num_hints_remaining(
        &self,
        result_id: i64,
        include_true_mutant_name: bool,
    ) -> Result<Option<NumHintsRemainingResponse>> {
        list::num_hints_remaining(self, result_id, include_true_mutant_name).await
    }

    // 当前变异体已解锁的提示（跨提交累计）
    pub async fn list_unlocked_hints_for_result(
        &self,
        result_id: i64,
        include_true_mutant_name: bool,
    ) -> Result<Vec<UnlockedHintResponse>> {
        list::list_unlocked_hints_for_result(self, result_id, include_true_mutant_name).await
    }

    // 小组解锁过的全部提示
    pub async fn list_unlocked_hints_for_group(
        &self,
        group_id: i64,
        include_true_mutant_name: bool,
    ) -> Result<Vec<UnlockedHintResponse>> {
        list::list_unlocked_hints_for_group(self, group_id, include_true_mutant_name).await
    }

    // 评价提示
    pub async fn rate_hint(
        &self,
        hint_id: i64,
        actor: &str,
        actor_group_id: i64,
        req: RateHintRequest,
    ) -> Result<UnlockedHint> {
        rate::rate_hint(self, hint_id, actor, actor_group_id, req).await
    }

    pub(crate) async fn load_suite(&self, suite_id: i64) -> Result<MutationTestSuite> {
        self.storage
            .get_mutation_test_suite_by_id(suite_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("变异测试套件 {suite_id} 不存在")))
    }

    pub(crate) async fn load_result(&self, result_id: i64) -> Result<MutationTestSuiteResult> {
        self.storage
            .get_mutation_test_suite_result_by_id(result_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("变异测试结果 {result_id} 不存在")))
    }

    pub(crate) async fn load_hint_config(
        &self,
        suite: &MutationTestSuite,
    ) -> Result<MutationTestSuiteHintConfig> {
        self.storage
            .get_hint_config_by_suite(suite.id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("套件 {} 没有提示配置", suite.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hint_defaults() {
        assert!(validate_hint_defaults(&HintDefaults::default()).is_ok());

        let err = validate_hint_defaults(&HintDefaults {
            default_reset_timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "E002");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::HintService;
    use crate::config::HintDefaults;
    use crate::models::groups::{
        entities::{Group, Submission},
        requests::{CreateGroupRequest, CreateSubmissionRequest},
    };
    use crate::models::mutant_hints::{
        entities::{MutationTestSuite, MutationTestSuiteHintConfig, MutationTestSuiteResult},
        requests::{
            CreateHintConfigRequest, CreateMutationTestSuiteRequest,
            CreateMutationTestSuiteResultRequest,
        },
    };
    use crate::storage::{Storage, memory_storage};

    pub(crate) struct Fixture {
        pub storage: Arc<dyn Storage>,
        pub service: Arc<HintService>,
        pub group: Group,
        pub submission: Submission,
    }

    impl Fixture {
        pub async fn suite(&self, mutants: &[&str]) -> MutationTestSuite {
            self.storage
                .create_mutation_test_suite(CreateMutationTestSuiteRequest {
                    project_id: self.group.project_id,
                    name: "Mutation Suite".to_string(),
                    buggy_impl_names: mutants.iter().map(|m| m.to_string()).collect(),
                })
                .await
                .unwrap()
        }

        pub async fn submit(&self) -> Submission {
            self.storage
                .create_submission(CreateSubmissionRequest {
                    group_id: self.group.id,
                    submitted_filenames: vec!["tests.cpp".to_string()],
                    submitted_at: None,
                })
                .await
                .unwrap()
        }

        pub async fn result(
            &self,
            suite: &MutationTestSuite,
            submission: &Submission,
            bugs_exposed: &[&str],
        ) -> MutationTestSuiteResult {
            self.storage
                .create_mutation_test_suite_result(CreateMutationTestSuiteResultRequest {
                    mutation_test_suite_id: suite.id,
                    submission_id: submission.id,
                    bugs_exposed: bugs_exposed.iter().map(|b| b.to_string()).collect(),
                })
                .await
                .unwrap()
        }

        pub async fn config(
            &self,
            suite: &MutationTestSuite,
            hints: &[(&str, &[&str])],
            req: CreateHintConfigRequest,
        ) -> MutationTestSuiteHintConfig {
            let hints_by_mutant_name: HashMap<String, Vec<String>> = hints
                .iter()
                .map(|(mutant, texts)| {
                    (
                        mutant.to_string(),
                        texts.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect();

            self.service
                .create_hint_config(
                    suite.id,
                    CreateHintConfigRequest {
                        hints_by_mutant_name,
                        ..req
                    },
                )
                .await
                .unwrap()
        }
    }

    pub(crate) async fn fixture() -> Fixture {
        fixture_on(memory_storage().await).await
    }

    pub(crate) async fn fixture_on(storage: Arc<dyn Storage>) -> Fixture {
        let service = Arc::new(HintService::new(storage.clone(), HintDefaults::default()));

        let group = storage
            .create_group(CreateGroupRequest {
                project_id: 3,
                member_names: vec!["alice".to_string(), "bob".to_string()],
            })
            .await
            .unwrap();
        let submission = storage
            .create_submission(CreateSubmissionRequest {
                group_id: group.id,
                submitted_filenames: vec!["tests.cpp".to_string()],
                submitted_at: None,
            })
            .await
            .unwrap();

        Fixture {
            storage,
            service,
            group,
            submission,
        }
    }
}
