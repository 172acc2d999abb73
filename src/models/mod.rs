//! 业务数据模型
//!
//! 与 `entity` 中的数据库实体分离，供服务层与调用方使用。

pub mod groups;
pub mod handgrading;
pub mod mutant_hints;

use serde::{Deserialize, Deserializer};

// 区分“字段缺省”和“显式置空”，配合 `Option<Option<T>>` 与 `#[serde(default)]` 使用
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
