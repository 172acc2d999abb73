use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 小组实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/group.ts")]
pub struct Group {
    pub id: i64,
    pub project_id: i64,
    pub member_names: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 提交实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/group.ts")]
pub struct Submission {
    pub id: i64,
    pub group_id: i64,
    // 提交的文件名列表，批注位置必须落在其中
    pub submitted_filenames: Vec<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}
