//! 评分项结果实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "criterion_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub result_id: i64,
    pub criterion_id: i64,
    pub selected: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::handgrading_results::Entity",
        from = "Column::ResultId",
        to = "super::handgrading_results::Column::Id",
        on_delete = "Cascade"
    )]
    Result,
    #[sea_orm(
        belongs_to = "super::criteria::Entity",
        from = "Column::CriterionId",
        to = "super::criteria::Column::Id",
        on_delete = "Cascade"
    )]
    Criterion,
}

impl Related<super::handgrading_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Result.def()
    }
}

impl Related<super::criteria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Criterion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_criterion_result(self) -> crate::models::handgrading::entities::CriterionResult {
        crate::models::handgrading::entities::CriterionResult {
            id: self.id,
            result_id: self.result_id,
            criterion_id: self.criterion_id,
            selected: self.selected,
        }
    }
}
