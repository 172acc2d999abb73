//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。
//! JSON 字段以文本存储，转换时解码。

pub mod prelude;

pub mod annotations;
pub mod applied_annotations;
pub mod comments;
pub mod criteria;
pub mod criterion_results;
pub mod groups;
pub mod handgrading_results;
pub mod handgrading_rubrics;
pub mod hint_configs;
pub mod mutation_test_suite_results;
pub mod mutation_test_suites;
pub mod submissions;
pub mod unlocked_hints;

use chrono::{DateTime, Utc};

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}
