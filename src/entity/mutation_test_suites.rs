//! 变异测试套件实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mutation_test_suites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    // 有序 JSON 数组
    #[sea_orm(column_type = "Text")]
    pub buggy_impl_names: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_suite(self) -> crate::errors::Result<crate::models::mutant_hints::entities::MutationTestSuite> {
        use crate::models::mutant_hints::entities::MutationTestSuite;

        Ok(MutationTestSuite {
            id: self.id,
            project_id: self.project_id,
            name: self.name,
            buggy_impl_names: serde_json::from_str(&self.buggy_impl_names)?,
            created_at: timestamp_to_datetime(self.created_at),
        })
    }
}
