use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    groups::{
        entities::{Group, Submission},
        requests::{CreateGroupRequest, CreateSubmissionRequest},
    },
    handgrading::{
        entities::{
            AppliedAnnotation, Annotation, Comment, Criterion, CriterionResult, HandgradingResult,
            HandgradingRubric,
        },
        requests::{
            ApplyAnnotationRequest, CreateAnnotationRequest, CreateCommentRequest,
            CreateCriterionRequest, CreateHandgradingResultRequest, CreateRubricRequest,
            UpdateAnnotationRequest, UpdateCommentRequest, UpdateCriterionRequest,
            UpdateHandgradingResultRequest, UpdateRubricRequest,
        },
    },
    mutant_hints::{
        entities::{
            MutationTestSuite, MutationTestSuiteHintConfig, MutationTestSuiteResult, UnlockedHint,
        },
        requests::{
            CreateMutationTestSuiteRequest, CreateMutationTestSuiteResultRequest,
            HintConfigValues, NewUnlockedHint,
        },
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 小组与提交
    // 创建小组
    async fn create_group(&self, req: CreateGroupRequest) -> Result<Group>;
    // 通过ID获取小组
    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;
    // 创建提交
    async fn create_submission(&self, req: CreateSubmissionRequest) -> Result<Submission>;
    // 通过ID获取提交
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;

    /// 评分细则
    // 创建评分细则
    async fn create_rubric(&self, req: CreateRubricRequest) -> Result<HandgradingRubric>;
    // 通过ID获取评分细则（含评分项和批注）
    async fn get_rubric_by_id(&self, rubric_id: i64) -> Result<Option<HandgradingRubric>>;
    // 通过项目ID获取评分细则
    async fn get_rubric_by_project(&self, project_id: i64) -> Result<Option<HandgradingRubric>>;
    // 更新评分细则
    async fn update_rubric(
        &self,
        rubric_id: i64,
        update: UpdateRubricRequest,
    ) -> Result<Option<HandgradingRubric>>;
    // 添加评分项，同时为已有评分结果补齐未选中的评分项结果
    async fn create_criterion(
        &self,
        rubric_id: i64,
        req: CreateCriterionRequest,
    ) -> Result<Criterion>;
    // 添加批注
    async fn create_annotation(
        &self,
        rubric_id: i64,
        req: CreateAnnotationRequest,
    ) -> Result<Annotation>;
    // 通过ID获取批注
    async fn get_annotation_by_id(&self, annotation_id: i64) -> Result<Option<Annotation>>;
    // 修改评分项
    async fn update_criterion(
        &self,
        criterion_id: i64,
        update: UpdateCriterionRequest,
    ) -> Result<Option<Criterion>>;
    // 删除评分项，连带删除其评分项结果
    async fn delete_criterion(&self, criterion_id: i64) -> Result<bool>;
    // 修改批注
    async fn update_annotation(
        &self,
        annotation_id: i64,
        update: UpdateAnnotationRequest,
    ) -> Result<Option<Annotation>>;
    // 删除批注，连带删除其应用记录
    async fn delete_annotation(&self, annotation_id: i64) -> Result<bool>;

    /// 人工评分结果
    // 获取或创建小组的评分结果，补齐未选中的评分项结果；第二项表示是否新建
    async fn create_handgrading_result(
        &self,
        req: CreateHandgradingResultRequest,
    ) -> Result<(HandgradingResult, bool)>;
    // 评分细则下的全部评分结果
    async fn list_handgrading_results_by_rubric(
        &self,
        rubric_id: i64,
    ) -> Result<Vec<HandgradingResult>>;
    // 通过ID获取评分结果（含子记录）
    async fn get_handgrading_result_by_id(
        &self,
        result_id: i64,
    ) -> Result<Option<HandgradingResult>>;
    // 更新分数调整和完成标记
    async fn update_handgrading_result(
        &self,
        result_id: i64,
        update: UpdateHandgradingResultRequest,
    ) -> Result<Option<HandgradingResult>>;
    // 选中/取消选中评分项结果
    async fn update_criterion_result(
        &self,
        criterion_result_id: i64,
        selected: bool,
    ) -> Result<Option<CriterionResult>>;
    // 应用批注
    async fn create_applied_annotation(
        &self,
        result_id: i64,
        req: ApplyAnnotationRequest,
    ) -> Result<AppliedAnnotation>;
    // 通过ID获取已应用批注
    async fn get_applied_annotation_by_id(&self, id: i64) -> Result<Option<AppliedAnnotation>>;
    // 移除已应用批注
    async fn delete_applied_annotation(&self, id: i64) -> Result<bool>;
    // 添加评语
    async fn create_comment(&self, result_id: i64, req: CreateCommentRequest) -> Result<Comment>;
    // 通过ID获取评语
    async fn get_comment_by_id(&self, comment_id: i64) -> Result<Option<Comment>>;
    // 修改评语
    async fn update_comment(
        &self,
        comment_id: i64,
        update: UpdateCommentRequest,
    ) -> Result<Option<Comment>>;
    // 删除评语
    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;

    /// 变异测试套件
    // 创建套件
    async fn create_mutation_test_suite(
        &self,
        req: CreateMutationTestSuiteRequest,
    ) -> Result<MutationTestSuite>;
    // 通过ID获取套件
    async fn get_mutation_test_suite_by_id(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuite>>;
    // 记录套件运行结果
    async fn create_mutation_test_suite_result(
        &self,
        req: CreateMutationTestSuiteResultRequest,
    ) -> Result<MutationTestSuiteResult>;
    // 通过ID获取套件运行结果（附带提交所属小组）
    async fn get_mutation_test_suite_result_by_id(
        &self,
        result_id: i64,
    ) -> Result<Option<MutationTestSuiteResult>>;

    /// 提示配置
    // 创建提示配置
    async fn create_hint_config(
        &self,
        suite_id: i64,
        values: HintConfigValues,
    ) -> Result<MutationTestSuiteHintConfig>;
    // 通过ID获取提示配置
    async fn get_hint_config_by_id(
        &self,
        config_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>>;
    // 通过套件ID获取提示配置
    async fn get_hint_config_by_suite(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>>;
    // 覆盖提示配置
    async fn update_hint_config(
        &self,
        config_id: i64,
        values: HintConfigValues,
    ) -> Result<Option<MutationTestSuiteHintConfig>>;
    // 删除提示配置（级联删除已解锁提示）
    async fn delete_hint_config(&self, config_id: i64) -> Result<bool>;

    /// 已解锁提示
    // 统计某次提交在某套件下已解锁的提示数
    async fn count_hints_for_submission(&self, suite_id: i64, submission_id: i64) -> Result<i64>;
    // 统计小组在 [start, end) 内按某配置解锁的提示数
    async fn count_hints_in_window(
        &self,
        group_id: i64,
        hint_config_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64>;
    // 小组针对某变异体解锁的最新一条提示（按 hint_number）
    async fn latest_unlocked_hint(
        &self,
        group_id: i64,
        mutant_name: &str,
    ) -> Result<Option<UnlockedHint>>;
    // 小组在某套件下针对某变异体解锁的全部提示
    async fn list_unlocked_hints_for_mutant(
        &self,
        group_id: i64,
        suite_id: i64,
        mutant_name: &str,
    ) -> Result<Vec<UnlockedHint>>;
    // 小组解锁的全部提示
    async fn list_unlocked_hints_for_group(&self, group_id: i64) -> Result<Vec<UnlockedHint>>;
    // 通过ID获取已解锁提示
    async fn get_unlocked_hint_by_id(&self, hint_id: i64) -> Result<Option<UnlockedHint>>;
    // 评价提示
    async fn rate_unlocked_hint(
        &self,
        hint_id: i64,
        hint_rating: i32,
        user_comment: Option<String>,
        rated_by: &str,
    ) -> Result<Option<UnlockedHint>>;
    // 锁定小组并开启解锁事务
    async fn begin_hint_unlock(&self, group_id: i64) -> Result<Box<dyn HintUnlockTransaction>>;
}

/// 持有小组互斥锁的解锁事务
///
/// 配额读取和提示写入都必须经由该对象完成，丢弃而未 `commit` 时回滚。
#[async_trait::async_trait]
pub trait HintUnlockTransaction: Send + Sync {
    // 被锁定的小组
    fn group(&self) -> &Group;
    async fn get_hint_config_by_suite(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>>;
    async fn count_hints_for_submission(&self, suite_id: i64, submission_id: i64) -> Result<i64>;
    async fn count_hints_in_window(
        &self,
        hint_config_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64>;
    async fn latest_unlocked_hint(&self, mutant_name: &str) -> Result<Option<UnlockedHint>>;
    async fn insert_unlocked_hint(&self, hint: NewUnlockedHint) -> Result<UnlockedHint>;
    async fn commit(self: Box<Self>) -> Result<()>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

/// 测试用的内存数据库
#[cfg(test)]
pub(crate) async fn memory_storage() -> Arc<dyn Storage> {
    let config = crate::config::DatabaseConfig {
        url: ":memory:".to_string(),
        ..Default::default()
    };
    let storage = sea_orm_storage::SeaOrmStorage::connect(&config)
        .await
        .expect("failed to open in-memory storage");
    Arc::new(storage)
}

/// 测试用的文件数据库（WAL 模式，多连接）
#[cfg(test)]
pub(crate) async fn file_storage(path: &std::path::Path) -> Arc<dyn Storage> {
    let config = crate::config::DatabaseConfig {
        url: path.to_string_lossy().into_owned(),
        ..Default::default()
    };
    let storage = sea_orm_storage::SeaOrmStorage::connect(&config)
        .await
        .expect("failed to open file storage");
    Arc::new(storage)
}
