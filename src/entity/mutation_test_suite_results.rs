//! 变异测试结果实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mutation_test_suite_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub mutation_test_suite_id: i64,
    pub submission_id: i64,
    #[sea_orm(column_type = "Text")]
    pub bugs_exposed: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mutation_test_suites::Entity",
        from = "Column::MutationTestSuiteId",
        to = "super::mutation_test_suites::Column::Id"
    )]
    MutationTestSuite,
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::mutation_test_suites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MutationTestSuite.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务模型，`group_id` 来自所属提交
    pub fn into_result(
        self,
        group_id: i64,
    ) -> crate::errors::Result<crate::models::mutant_hints::entities::MutationTestSuiteResult> {
        use crate::models::mutant_hints::entities::MutationTestSuiteResult;

        Ok(MutationTestSuiteResult {
            id: self.id,
            mutation_test_suite_id: self.mutation_test_suite_id,
            submission_id: self.submission_id,
            group_id,
            bugs_exposed: serde_json::from_str(&self.bugs_exposed)?,
            created_at: timestamp_to_datetime(self.created_at),
        })
    }
}
