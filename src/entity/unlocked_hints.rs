//! 已解锁提示实体

use sea_orm::entity::prelude::*;

use super::timestamp_to_datetime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "unlocked_hints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub mutation_test_suite_result_id: i64,
    pub hint_config_id: i64,
    pub mutant_name: String,
    pub hint_number: i32,
    #[sea_orm(column_type = "Text")]
    pub hint_text: String,
    pub unlocked_by: String,
    pub hint_rating: Option<i32>,
    pub rated_by: String,
    #[sea_orm(column_type = "Text")]
    pub user_comment: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mutation_test_suite_results::Entity",
        from = "Column::MutationTestSuiteResultId",
        to = "super::mutation_test_suite_results::Column::Id"
    )]
    MutationTestSuiteResult,
    #[sea_orm(
        belongs_to = "super::hint_configs::Entity",
        from = "Column::HintConfigId",
        to = "super::hint_configs::Column::Id"
    )]
    HintConfig,
}

impl Related<super::mutation_test_suite_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MutationTestSuiteResult.def()
    }
}

impl Related<super::hint_configs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HintConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_unlocked_hint(self) -> crate::models::mutant_hints::entities::UnlockedHint {
        use crate::models::mutant_hints::entities::UnlockedHint;

        UnlockedHint {
            id: self.id,
            mutation_test_suite_result_id: self.mutation_test_suite_result_id,
            hint_config_id: self.hint_config_id,
            mutant_name: self.mutant_name,
            hint_number: self.hint_number,
            hint_text: self.hint_text,
            unlocked_by: self.unlocked_by,
            hint_rating: self.hint_rating,
            rated_by: self.rated_by,
            user_comment: self.user_comment,
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}
