//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod groups;
mod handgrading;
mod mutant_hints;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{HWSystemError, Result};
use dashmap::DashMap;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
    // 进程内的小组锁，SQLite 不支持 SELECT ... FOR UPDATE
    pub(crate) group_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl SeaOrmStorage {
    /// 使用全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database).await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self {
            db,
            group_locks: Arc::new(DashMap::new()),
        })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| HWSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .pragma("mmap_size", "536870912")
                .pragma("wal_autocheckpoint", "1000");
        }

        // 内存数据库每个连接都是独立的库，只能保留一个常驻连接
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.pool_size)
                .min_connections(1)
                .test_before_acquire(true)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(config.timeout))
            .connect_with(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url == ":memory:" || url == "sqlite::memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(HWSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
            HintConfigValues,
        },
    },
};
use crate::storage::{HintUnlockTransaction, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 小组模块
    async fn create_group(&self, req: CreateGroupRequest) -> Result<Group> {
        self.create_group_impl(req).await
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        self.get_group_by_id_impl(group_id).await
    }

    async fn create_submission(&self, req: CreateSubmissionRequest) -> Result<Submission> {
        self.create_submission_impl(req).await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    // 评分细则模块
    async fn create_rubric(&self, req: CreateRubricRequest) -> Result<HandgradingRubric> {
        self.create_rubric_impl(req).await
    }

    async fn get_rubric_by_id(&self, rubric_id: i64) -> Result<Option<HandgradingRubric>> {
        self.get_rubric_by_id_impl(rubric_id).await
    }

    async fn get_rubric_by_project(&self, project_id: i64) -> Result<Option<HandgradingRubric>> {
        self.get_rubric_by_project_impl(project_id).await
    }

    async fn update_rubric(
        &self,
        rubric_id: i64,
        update: UpdateRubricRequest,
    ) -> Result<Option<HandgradingRubric>> {
        self.update_rubric_impl(rubric_id, update).await
    }

    async fn create_criterion(
        &self,
        rubric_id: i64,
        req: CreateCriterionRequest,
    ) -> Result<Criterion> {
        self.create_criterion_impl(rubric_id, req).await
    }

    async fn create_annotation(
        &self,
        rubric_id: i64,
        req: CreateAnnotationRequest,
    ) -> Result<Annotation> {
        self.create_annotation_impl(rubric_id, req).await
    }

    async fn get_annotation_by_id(&self, annotation_id: i64) -> Result<Option<Annotation>> {
        self.get_annotation_by_id_impl(annotation_id).await
    }

    async fn update_criterion(
        &self,
        criterion_id: i64,
        update: UpdateCriterionRequest,
    ) -> Result<Option<Criterion>> {
        self.update_criterion_impl(criterion_id, update).await
    }

    async fn delete_criterion(&self, criterion_id: i64) -> Result<bool> {
        self.delete_criterion_impl(criterion_id).await
    }

    async fn update_annotation(
        &self,
        annotation_id: i64,
        update: UpdateAnnotationRequest,
    ) -> Result<Option<Annotation>> {
        self.update_annotation_impl(annotation_id, update).await
    }

    async fn delete_annotation(&self, annotation_id: i64) -> Result<bool> {
        self.delete_annotation_impl(annotation_id).await
    }

    // 人工评分结果模块
    async fn create_handgrading_result(
        &self,
        req: CreateHandgradingResultRequest,
    ) -> Result<(HandgradingResult, bool)> {
        self.create_handgrading_result_impl(req).await
    }

    async fn list_handgrading_results_by_rubric(
        &self,
        rubric_id: i64,
    ) -> Result<Vec<HandgradingResult>> {
        self.list_handgrading_results_by_rubric_impl(rubric_id)
            .await
    }

    async fn get_handgrading_result_by_id(
        &self,
        result_id: i64,
    ) -> Result<Option<HandgradingResult>> {
        self.get_handgrading_result_by_id_impl(result_id).await
    }

    async fn update_handgrading_result(
        &self,
        result_id: i64,
        update: UpdateHandgradingResultRequest,
    ) -> Result<Option<HandgradingResult>> {
        self.update_handgrading_result_impl(result_id, update).await
    }

    async fn update_criterion_result(
        &self,
        criterion_result_id: i64,
        selected: bool,
    ) -> Result<Option<CriterionResult>> {
        self.update_criterion_result_impl(criterion_result_id, selected)
            .await
    }

    async fn create_applied_annotation(
        &self,
        result_id: i64,
        req: ApplyAnnotationRequest,
    ) -> Result<AppliedAnnotation> {
        self.create_applied_annotation_impl(result_id, req).await
    }

    async fn get_applied_annotation_by_id(&self, id: i64) -> Result<Option<AppliedAnnotation>> {
        self.get_applied_annotation_by_id_impl(id).await
    }

    async fn delete_applied_annotation(&self, id: i64) -> Result<bool> {
        self.delete_applied_annotation_impl(id).await
    }

    async fn create_comment(&self, result_id: i64, req: CreateCommentRequest) -> Result<Comment> {
        self.create_comment_impl(result_id, req).await
    }

    async fn get_comment_by_id(&self, comment_id: i64) -> Result<Option<Comment>> {
        self.get_comment_by_id_impl(comment_id).await
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        update: UpdateCommentRequest,
    ) -> Result<Option<Comment>> {
        self.update_comment_impl(comment_id, update).await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        self.delete_comment_impl(comment_id).await
    }

    // 变异测试模块
    async fn create_mutation_test_suite(
        &self,
        req: CreateMutationTestSuiteRequest,
    ) -> Result<MutationTestSuite> {
        self.create_mutation_test_suite_impl(req).await
    }

    async fn get_mutation_test_suite_by_id(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuite>> {
        self.get_mutation_test_suite_by_id_impl(suite_id).await
    }

    async fn create_mutation_test_suite_result(
        &self,
        req: CreateMutationTestSuiteResultRequest,
    ) -> Result<MutationTestSuiteResult> {
        self.create_mutation_test_suite_result_impl(req).await
    }

    async fn get_mutation_test_suite_result_by_id(
        &self,
        result_id: i64,
    ) -> Result<Option<MutationTestSuiteResult>> {
        self.get_mutation_test_suite_result_by_id_impl(result_id)
            .await
    }

    // 提示配置模块
    async fn create_hint_config(
        &self,
        suite_id: i64,
        values: HintConfigValues,
    ) -> Result<MutationTestSuiteHintConfig> {
        self.create_hint_config_impl(suite_id, values).await
    }

    async fn get_hint_config_by_id(
        &self,
        config_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>> {
        self.get_hint_config_by_id_impl(config_id).await
    }

    async fn get_hint_config_by_suite(
        &self,
        suite_id: i64,
    ) -> Result<Option<MutationTestSuiteHintConfig>> {
        mutant_hints::find_hint_config_by_suite(&self.db, suite_id).await
    }

    async fn update_hint_config(
        &self,
        config_id: i64,
        values: HintConfigValues,
    ) -> Result<Option<MutationTestSuiteHintConfig>> {
        self.update_hint_config_impl(config_id, values).await
    }

    async fn delete_hint_config(&self, config_id: i64) -> Result<bool> {
        self.delete_hint_config_impl(config_id).await
    }

    // 已解锁提示模块
    async fn count_hints_for_submission(&self, suite_id: i64, submission_id: i64) -> Result<i64> {
        mutant_hints::count_hints_for_submission(&self.db, suite_id, submission_id).await
    }

    async fn count_hints_in_window(
        &self,
        group_id: i64,
        hint_config_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        mutant_hints::count_hints_in_window(&self.db, group_id, hint_config_id, start, end).await
    }

    async fn latest_unlocked_hint(
        &self,
        group_id: i64,
        mutant_name: &str,
    ) -> Result<Option<UnlockedHint>> {
        mutant_hints::find_latest_unlocked_hint(&self.db, group_id, mutant_name).await
    }

    async fn list_unlocked_hints_for_mutant(
        &self,
        group_id: i64,
        suite_id: i64,
        mutant_name: &str,
    ) -> Result<Vec<UnlockedHint>> {
        self.list_unlocked_hints_for_mutant_impl(group_id, suite_id, mutant_name)
            .await
    }

    async fn list_unlocked_hints_for_group(&self, group_id: i64) -> Result<Vec<UnlockedHint>> {
        self.list_unlocked_hints_for_group_impl(group_id).await
    }

    async fn get_unlocked_hint_by_id(&self, hint_id: i64) -> Result<Option<UnlockedHint>> {
        self.get_unlocked_hint_by_id_impl(hint_id).await
    }

    async fn rate_unlocked_hint(
        &self,
        hint_id: i64,
        hint_rating: i32,
        user_comment: Option<String>,
        rated_by: &str,
    ) -> Result<Option<UnlockedHint>> {
        self.rate_unlocked_hint_impl(hint_id, hint_rating, user_comment, rated_by)
            .await
    }

    async fn begin_hint_unlock(&self, group_id: i64) -> Result<Box<dyn HintUnlockTransaction>> {
        let unlock = self.begin_hint_unlock_impl(group_id).await?;
        Ok(Box::new(unlock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("grading.db").unwrap(),
            "sqlite://grading.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://localhost/hw").unwrap(),
            "postgres://localhost/hw"
        );
        assert!(SeaOrmStorage::build_database_url("redis://localhost").is_err());
    }

    #[tokio::test]
    async fn test_connect_in_memory_runs_migrations() {
        let config = DatabaseConfig {
            url: ":memory:".to_string(),
            ..Default::default()
        };
        let storage = SeaOrmStorage::connect(&config).await.unwrap();

        let group = storage
            .create_group(CreateGroupRequest {
                project_id: 1,
                member_names: vec!["alice".to_string()],
            })
            .await
            .unwrap();
        let loaded = storage.get_group_by_id(group.id).await.unwrap().unwrap();
        assert_eq!(loaded.member_names, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn test_group_locks_removed_after_release() {
        let config = DatabaseConfig {
            url: ":memory:".to_string(),
            ..Default::default()
        };
        let storage = SeaOrmStorage::connect(&config).await.unwrap();
        let group = storage
            .create_group(CreateGroupRequest {
                project_id: 1,
                member_names: vec!["alice".to_string()],
            })
            .await
            .unwrap();

        let unlock = storage.begin_hint_unlock_impl(group.id).await.unwrap();
        assert_eq!(storage.group_locks.len(), 1);
        Box::new(unlock).commit().await.unwrap();
        assert!(storage.group_locks.is_empty());

        // 未提交直接丢弃
        let unlock = storage.begin_hint_unlock_impl(group.id).await.unwrap();
        drop(unlock);
        assert!(storage.group_locks.is_empty());

        assert!(storage.begin_hint_unlock_impl(9999).await.is_err());
        assert!(storage.group_locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_group_lock_kept_while_waiters_remain() {
        let config = DatabaseConfig {
            url: ":memory:".to_string(),
            ..Default::default()
        };
        let storage = Arc::new(SeaOrmStorage::connect(&config).await.unwrap());
        let group = storage
            .create_group(CreateGroupRequest {
                project_id: 1,
                member_names: vec!["alice".to_string()],
            })
            .await
            .unwrap();
        let group_id = group.id;

        let first = storage.begin_hint_unlock_impl(group_id).await.unwrap();
        let waiter = {
            let storage = storage.clone();
            tokio::spawn(async move {
                let unlock = storage.begin_hint_unlock_impl(group_id).await.unwrap();
                Box::new(unlock).commit().await.unwrap();
            })
        };

        // 等待者已经拿到同一把锁的引用
        while Arc::strong_count(storage.group_locks.get(&group_id).unwrap().value()) < 3 {
            tokio::task::yield_now().await;
        }

        Box::new(first).commit().await.unwrap();
        waiter.await.unwrap();
        assert!(storage.group_locks.is_empty());
    }
}

