use serde::Deserialize;
use ts_rs::TS;

/// 创建小组请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/group.ts")]
pub struct CreateGroupRequest {
    pub project_id: i64,
    pub member_names: Vec<String>,
}

/// 创建提交请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/group.ts")]
pub struct CreateSubmissionRequest {
    pub group_id: i64,
    pub submitted_filenames: Vec<String>,
    // 为空时使用当前时间
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}
