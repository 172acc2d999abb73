//! 小组与提交存储操作

use super::SeaOrmStorage;
use crate::entity::groups::{ActiveModel as GroupActiveModel, Entity as Groups};
use crate::entity::submissions::{ActiveModel as SubmissionActiveModel, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::groups::{
    entities::{Group, Submission},
    requests::{CreateGroupRequest, CreateSubmissionRequest},
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    /// 创建小组
    pub async fn create_group_impl(&self, req: CreateGroupRequest) -> Result<Group> {
        let now = chrono::Utc::now().timestamp();

        let model = GroupActiveModel {
            project_id: Set(req.project_id),
            member_names: Set(serde_json::to_string(&req.member_names)?),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建小组失败: {e}")))?;

        result.into_group()
    }

    /// 通过 ID 获取小组
    pub async fn get_group_by_id_impl(&self, group_id: i64) -> Result<Option<Group>> {
        let result = Groups::find_by_id(group_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询小组失败: {e}")))?;

        result.map(|m| m.into_group()).transpose()
    }

    /// 创建提交
    pub async fn create_submission_impl(&self, req: CreateSubmissionRequest) -> Result<Submission> {
        let submitted_at = req
            .submitted_at
            .unwrap_or_else(chrono::Utc::now)
            .timestamp();

        let model = SubmissionActiveModel {
            group_id: Set(req.group_id),
            submitted_filenames: Set(serde_json::to_string(&req.submitted_filenames)?),
            submitted_at: Set(submitted_at),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建提交失败: {e}")))?;

        result.into_submission()
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.into_submission()).transpose()
    }
}
