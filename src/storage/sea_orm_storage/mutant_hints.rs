//! 变异测试提示存储操作

use super::SeaOrmStorage;
use crate::entity::groups::{Column as GroupColumn, Entity as Groups};
use crate::entity::hint_configs::{
    ActiveModel as HintConfigActiveModel, Column as HintConfigColumn, Entity as HintConfigs,
    RESET_TIME_FORMAT,
};
use crate::entity::mutation_test_suite_results::{
    self, ActiveModel as SuiteResultActiveModel, Column as SuiteResultColumn,
    Entity as MutationTestSuiteResults,
};
use crate::entity::mutation_test_suites::{
    ActiveModel as SuiteActiveModel, Entity as MutationTestSuites,
};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::entity::unlocked_hints::{
    self, ActiveModel as UnlockedHintActiveModel, Column as UnlockedHintColumn,
    Entity as UnlockedHints,
};
use crate::errors::{HWSystemError, Result};
use crate::models::groups::entities::Group;
use crate::models::mutant_hints::{
    entities::{
        MutationTestSuite, MutationTestSuiteHintConfig, MutationTestSuiteResult, UnlockedHint,
    },
    requests::{
        CreateMutationTestSuiteRequest, CreateMutationTestSuiteResultRequest, HintConfigValues,
        NewUnlockedHint,
    },
};
use crate::storage::HintUnlockTransaction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

impl SeaOrmStorage {
    /// 创建变异测试套件
    pub async fn create_mutation_test_suite_impl(
        &self,
        req: CreateMutationTestSuiteRequest,
    ) -> Result<MutationTestSuite> {
        let now = chrono::Utc::now().timestamp();

        let model = SuiteActiveModel {
            project_id: Set(req.project_id),
            name: Set(req.name),
            buggy_impl_names: Set(serde_json::to_string(&req.buggy_impl_names)?),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建变异测试套件失败: {e}")))?;

        result.into_suite()
    }

    /// 通过 ID 获取变异测试套件
    pub async fn get_mutation_test_suite_by_id_impl(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuite>> {
        let result = MutationTestSuites::find_by_id(suite_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询变异测试套件失败: {e}")))?;

        result.map(|m| m.into_suite()).transpose()
    }

    /// 记录变异测试结果
    pub async fn create_mutation_test_suite_result_impl(
        &self,
        req: CreateMutationTestSuiteResultRequest,
    ) -> Result<MutationTestSuiteResult> {
        let submission = Submissions::find_by_id(req.submission_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("提交 {} 不存在", req.submission_id)))?;

        let now = chrono::Utc::now().timestamp();

        let model = SuiteResultActiveModel {
            mutation_test_suite_id: Set(req.mutation_test_suite_id),
            submission_id: Set(req.submission_id),
            bugs_exposed: Set(serde_json::to_string(&req.bugs_exposed)?),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("记录变异测试结果失败: {e}")))?;

        result.into_result(submission.group_id)
    }

    /// 通过 ID 获取变异测试结果
    pub async fn get_mutation_test_suite_result_by_id_impl(
        &self,
        result_id: i64,
    ) -> Result<Option<MutationTestSuiteResult>> {
        let result = MutationTestSuiteResults::find_by_id(result_id)
            .find_also_related(Submissions)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询变异测试结果失败: {e}")))?;

        match result {
            Some((model, Some(submission))) => Ok(Some(model.into_result(submission.group_id)?)),
            Some((model, None)) => Err(HWSystemError::not_found(format!(
                "变异测试结果 {} 所属的提交不存在",
                model.id
            ))),
            None => Ok(None),
        }
    }

    /// 创建提示配置
    pub async fn create_hint_config_impl(
        &self,
        suite_id: i64,
        values: HintConfigValues,
    ) -> Result<MutationTestSuiteHintConfig> {
        let now = chrono::Utc::now().timestamp();

        let model = HintConfigActiveModel {
            mutation_test_suite_id: Set(suite_id),
            hints_by_mutant_name: Set(serde_json::to_string(&values.hints_by_mutant_name)?),
            num_hints_per_day: Set(values.num_hints_per_day),
            num_hints_per_submission: Set(values.num_hints_per_submission),
            hint_limit_reset_time: Set(values
                .hint_limit_reset_time
                .format(RESET_TIME_FORMAT)
                .to_string()),
            hint_limit_reset_timezone: Set(values.hint_limit_reset_timezone),
            obfuscate_mutant_names: Set(values.obfuscate_mutant_names.to_string()),
            obfuscated_mutant_name_prefix: Set(values.obfuscated_mutant_name_prefix),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建提示配置失败: {e}")))?;

        result.into_hint_config()
    }

    /// 通过 ID 获取提示配置
    pub async fn get_hint_config_by_id_impl(
        &self,
        config_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>> {
        let result = HintConfigs::find_by_id(config_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提示配置失败: {e}")))?;

        result.map(|m| m.into_hint_config()).transpose()
    }

    /// 覆盖提示配置
    pub async fn update_hint_config_impl(
        &self,
        config_id: i64,
        values: HintConfigValues,
    ) -> Result<Option<MutationTestSuiteHintConfig>> {
        let existing = self.get_hint_config_by_id_impl(config_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let model = HintConfigActiveModel {
            id: Set(config_id),
            hints_by_mutant_name: Set(serde_json::to_string(&values.hints_by_mutant_name)?),
            num_hints_per_day: Set(values.num_hints_per_day),
            num_hints_per_submission: Set(values.num_hints_per_submission),
            hint_limit_reset_time: Set(values
                .hint_limit_reset_time
                .format(RESET_TIME_FORMAT)
                .to_string()),
            hint_limit_reset_timezone: Set(values.hint_limit_reset_timezone),
            obfuscate_mutant_names: Set(values.obfuscate_mutant_names.to_string()),
            obfuscated_mutant_name_prefix: Set(values.obfuscated_mutant_name_prefix),
            updated_at: Set(now),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新提示配置失败: {e}")))?;

        self.get_hint_config_by_id_impl(config_id).await
    }

    /// 删除提示配置
    pub async fn delete_hint_config_impl(&self, config_id: i64) -> Result<bool> {
        let result = HintConfigs::delete_by_id(config_id)
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除提示配置失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 小组在某套件下针对某变异体解锁的提示
    pub async fn list_unlocked_hints_for_mutant_impl(
        &self,
        group_id: i64,
        suite_id: i64,
        mutant_name: &str,
    ) -> Result<Vec<UnlockedHint>> {
        let hints = hints_of_group(group_id)
            .filter(SuiteResultColumn::MutationTestSuiteId.eq(suite_id))
            .filter(UnlockedHintColumn::MutantName.eq(mutant_name))
            .order_by_asc(UnlockedHintColumn::HintNumber)
            .order_by_asc(UnlockedHintColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询已解锁提示失败: {e}")))?;

        Ok(hints.into_iter().map(|m| m.into_unlocked_hint()).collect())
    }

    /// 小组解锁的全部提示
    pub async fn list_unlocked_hints_for_group_impl(
        &self,
        group_id: i64,
    ) -> Result<Vec<UnlockedHint>> {
        let hints = hints_of_group(group_id)
            .order_by_asc(UnlockedHintColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询已解锁提示失败: {e}")))?;

        Ok(hints.into_iter().map(|m| m.into_unlocked_hint()).collect())
    }

    /// 通过 ID 获取已解锁提示
    pub async fn get_unlocked_hint_by_id_impl(&self, hint_id: i64) -> Result<Option<UnlockedHint>> {
        let result = UnlockedHints::find_by_id(hint_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询已解锁提示失败: {e}")))?;

        Ok(result.map(|m| m.into_unlocked_hint()))
    }

    /// 评价提示
    pub async fn rate_unlocked_hint_impl(
        &self,
        hint_id: i64,
        hint_rating: i32,
        user_comment: Option<String>,
        rated_by: &str,
    ) -> Result<Option<UnlockedHint>> {
        let existing = self.get_unlocked_hint_by_id_impl(hint_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = UnlockedHintActiveModel {
            id: Set(hint_id),
            hint_rating: Set(Some(hint_rating)),
            rated_by: Set(rated_by.to_string()),
            ..Default::default()
        };

        if let Some(user_comment) = user_comment {
            model.user_comment = Set(user_comment);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("评价提示失败: {e}")))?;

        self.get_unlocked_hint_by_id_impl(hint_id).await
    }

    /// 锁定小组并开启事务
    ///
    /// 先取进程内小组锁再开启事务：内存 SQLite 只有一个连接，
    /// 反过来会让等锁的请求占住连接。
    ///
    /// SQLite 没有行锁，事务的第一条语句就对小组行做一次空更新，
    /// 提前拿到数据库写锁。之后的读取都在写锁下进行，
    /// 不会因为读快照过期而在写入时返回 busy。
    pub async fn begin_hint_unlock_impl(&self, group_id: i64) -> Result<SeaOrmHintUnlock> {
        let lock = GroupLockGuard::acquire(self.group_locks.clone(), group_id).await;

        let txn = self.db.begin().await.map_err(|e| {
            HWSystemError::database_operation(format!("开启解锁事务失败: {e}"))
        })?;

        let mut query = Groups::find_by_id(group_id);
        if txn.get_database_backend() == DbBackend::Sqlite {
            Groups::update_many()
                .col_expr(GroupColumn::Id, Expr::col(GroupColumn::Id))
                .filter(GroupColumn::Id.eq(group_id))
                .exec(&txn)
                .await
                .map_err(|e| HWSystemError::database_operation(format!("锁定小组失败: {e}")))?;
        } else {
            query = query.lock_exclusive();
        }

        let group = query
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("锁定小组失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("小组 {group_id} 不存在")))?
            .into_group()?;

        debug!("Group {} locked for hint unlock", group_id);

        Ok(SeaOrmHintUnlock {
            txn,
            group,
            _lock: lock,
        })
    }
}

/// 进程内小组锁
///
/// 释放时如果没有其他请求持有或等待同一把锁，就把它从锁表中移除，
/// 锁表大小只取决于正在解锁的小组数。
struct GroupLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
    group_id: i64,
}

impl GroupLockGuard {
    async fn acquire(locks: Arc<DashMap<i64, Arc<Mutex<()>>>>, group_id: i64) -> Self {
        let lock = locks.entry(group_id).or_default().value().clone();
        let guard = lock.lock_owned().await;
        Self {
            guard: Some(guard),
            locks,
            group_id,
        }
    }
}

impl Drop for GroupLockGuard {
    fn drop(&mut self) {
        // 守卫自身也持有一份 Arc，先释放再判断引用数
        drop(self.guard.take());
        self.locks.remove_if(&self.group_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// 小组解锁事务
///
/// 字段按声明顺序释放：先回滚未提交的事务，再释放小组锁。
pub struct SeaOrmHintUnlock {
    txn: DatabaseTransaction,
    group: Group,
    _lock: GroupLockGuard,
}

#[async_trait]
impl HintUnlockTransaction for SeaOrmHintUnlock {
    fn group(&self) -> &Group {
        &self.group
    }

    async fn get_hint_config_by_suite(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>> {
        find_hint_config_by_suite(&self.txn, suite_id).await
    }

    async fn count_hints_for_submission(&self, suite_id: i64, submission_id: i64) -> Result<i64> {
        count_hints_for_submission(&self.txn, suite_id, submission_id).await
    }

    async fn count_hints_in_window(
        &self,
        hint_config_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        count_hints_in_window(&self.txn, self.group.id, hint_config_id, start, end).await
    }

    async fn latest_unlocked_hint(&self, mutant_name: &str) -> Result<Option<UnlockedHint>> {
        find_latest_unlocked_hint(&self.txn, self.group.id, mutant_name).await
    }

    async fn insert_unlocked_hint(&self, hint: NewUnlockedHint) -> Result<UnlockedHint> {
        let model = UnlockedHintActiveModel {
            mutation_test_suite_result_id: Set(hint.mutation_test_suite_result_id),
            hint_config_id: Set(hint.hint_config_id),
            mutant_name: Set(hint.mutant_name),
            hint_number: Set(hint.hint_number),
            hint_text: Set(hint.hint_text),
            unlocked_by: Set(hint.unlocked_by),
            hint_rating: Set(None),
            rated_by: Set(String::new()),
            user_comment: Set(String::new()),
            created_at: Set(hint.created_at.timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("写入已解锁提示失败: {e}")))?;

        Ok(result.into_unlocked_hint())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let SeaOrmHintUnlock { txn, _lock, .. } = *self;
        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交解锁事务失败: {e}")))
    }
}

// 经由结果和提交关联到小组的提示查询
fn hints_of_group(group_id: i64) -> Select<UnlockedHints> {
    UnlockedHints::find()
        .join(
            JoinType::InnerJoin,
            unlocked_hints::Relation::MutationTestSuiteResult.def(),
        )
        .join(
            JoinType::InnerJoin,
            mutation_test_suite_results::Relation::Submission.def(),
        )
        .filter(SubmissionColumn::GroupId.eq(group_id))
}

pub(super) async fn find_hint_config_by_suite<C: ConnectionTrait>(
    db: &C,
    suite_id: i64,
) -> Result<Option<MutationTestSuiteHintConfig>> {
    let result = HintConfigs::find()
        .filter(HintConfigColumn::MutationTestSuiteId.eq(suite_id))
        .one(db)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("查询提示配置失败: {e}")))?;

    result.map(|m| m.into_hint_config()).transpose()
}

pub(super) async fn count_hints_for_submission<C: ConnectionTrait>(
    db: &C,
    suite_id: i64,
    submission_id: i64,
) -> Result<i64> {
    let count = UnlockedHints::find()
        .join(
            JoinType::InnerJoin,
            unlocked_hints::Relation::MutationTestSuiteResult.def(),
        )
        .filter(SuiteResultColumn::SubmissionId.eq(submission_id))
        .filter(SuiteResultColumn::MutationTestSuiteId.eq(suite_id))
        .count(db)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("统计提交提示数失败: {e}")))?;

    Ok(count as i64)
}

pub(super) async fn count_hints_in_window<C: ConnectionTrait>(
    db: &C,
    group_id: i64,
    hint_config_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64> {
    let count = hints_of_group(group_id)
        .filter(UnlockedHintColumn::HintConfigId.eq(hint_config_id))
        .filter(UnlockedHintColumn::CreatedAt.gte(start.timestamp()))
        .filter(UnlockedHintColumn::CreatedAt.lt(end.timestamp()))
        .count(db)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("统计当日提示数失败: {e}")))?;

    Ok(count as i64)
}

pub(super) async fn find_latest_unlocked_hint<C: ConnectionTrait>(
    db: &C,
    group_id: i64,
    mutant_name: &str,
) -> Result<Option<UnlockedHint>> {
    let result = hints_of_group(group_id)
        .filter(UnlockedHintColumn::MutantName.eq(mutant_name))
        .order_by_desc(UnlockedHintColumn::HintNumber)
        .one(db)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("查询最新提示失败: {e}")))?;

    Ok(result.map(|m| m.into_unlocked_hint()))
}
