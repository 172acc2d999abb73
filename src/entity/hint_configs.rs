//! 变异测试提示配置实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;
use crate::errors::HWSystemError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mutation_test_suite_hint_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub mutation_test_suite_id: i64,
    #[sea_orm(column_type = "Text")]
    pub hints_by_mutant_name: String,
    pub num_hints_per_day: Option<i32>,
    pub num_hints_per_submission: Option<i32>,
    // "HH:MM:SS"
    pub hint_limit_reset_time: String,
    pub hint_limit_reset_timezone: String,
    pub obfuscate_mutant_names: String,
    pub obfuscated_mutant_name_prefix: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mutation_test_suites::Entity",
        from = "Column::MutationTestSuiteId",
        to = "super::mutation_test_suites::Column::Id"
    )]
    MutationTestSuite,
}

impl Related<super::mutation_test_suites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MutationTestSuite.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) const RESET_TIME_FORMAT: &str = "%H:%M:%S";

impl Model {
    pub fn into_hint_config(
        self,
    ) -> crate::errors::Result<crate::models::mutant_hints::entities::MutationTestSuiteHintConfig> {
        use crate::models::mutant_hints::entities::MutationTestSuiteHintConfig;

        Ok(MutationTestSuiteHintConfig {
            id: self.id,
            mutation_test_suite_id: self.mutation_test_suite_id,
            hints_by_mutant_name: serde_json::from_str(&self.hints_by_mutant_name)?,
            num_hints_per_day: self.num_hints_per_day,
            num_hints_per_submission: self.num_hints_per_submission,
            hint_limit_reset_time: chrono::NaiveTime::parse_from_str(
                &self.hint_limit_reset_time,
                RESET_TIME_FORMAT,
            )?,
            hint_limit_reset_timezone: self.hint_limit_reset_timezone,
            obfuscate_mutant_names: self
                .obfuscate_mutant_names
                .parse()
                .map_err(HWSystemError::serialization)?,
            obfuscated_mutant_name_prefix: self.obfuscated_mutant_name_prefix,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }
}
