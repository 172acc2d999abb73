use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建评分细则表（每个项目一份）
        manager
            .create_table(
                Table::create()
                    .table(HandgradingRubrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HandgradingRubrics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HandgradingRubrics::ProjectId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(HandgradingRubrics::PointsStyle)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HandgradingRubrics::MaxPoints).double().null())
                    .col(
                        ColumnDef::new(HandgradingRubrics::ShowGradesAndRubricToStudents)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(HandgradingRubrics::ShowOnlyAppliedRubricToStudents)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(HandgradingRubrics::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HandgradingRubrics::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分项表
        manager
            .create_table(
                Table::create()
                    .table(Criteria::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Criteria::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Criteria::RubricId).big_integer().not_null())
                    .col(ColumnDef::new(Criteria::ShortDescription).text().not_null())
                    .col(ColumnDef::new(Criteria::LongDescription).text().not_null())
                    .col(ColumnDef::new(Criteria::Points).double().not_null())
                    .col(ColumnDef::new(Criteria::SortOrder).integer().not_null())
                    .col(ColumnDef::new(Criteria::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Criteria::Table, Criteria::RubricId)
                            .to(HandgradingRubrics::Table, HandgradingRubrics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建批注表
        manager
            .create_table(
                Table::create()
                    .table(Annotations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Annotations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Annotations::RubricId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Annotations::ShortDescription)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Annotations::LongDescription)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Annotations::Deduction).double().not_null())
                    .col(ColumnDef::new(Annotations::MaxDeduction).double().null())
                    .col(ColumnDef::new(Annotations::SortOrder).integer().not_null())
                    .col(
                        ColumnDef::new(Annotations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Annotations::Table, Annotations::RubricId)
                            .to(HandgradingRubrics::Table, HandgradingRubrics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建人工评分结果表
        manager
            .create_table(
                Table::create()
                    .table(HandgradingResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HandgradingResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::RubricId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::GroupId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::SubmissionId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::PointsAdjustment)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::FinishedGrading)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HandgradingResults::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(HandgradingResults::Table, HandgradingResults::RubricId)
                            .to(HandgradingRubrics::Table, HandgradingRubrics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(HandgradingResults::Table, HandgradingResults::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(HandgradingResults::Table, HandgradingResults::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分项结果表
        manager
            .create_table(
                Table::create()
                    .table(CriterionResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CriterionResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CriterionResults::ResultId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CriterionResults::CriterionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CriterionResults::Selected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CriterionResults::Table, CriterionResults::ResultId)
                            .to(HandgradingResults::Table, HandgradingResults::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CriterionResults::Table, CriterionResults::CriterionId)
                            .to(Criteria::Table, Criteria::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建已应用批注表（位置信息内联存储）
        manager
            .create_table(
                Table::create()
                    .table(AppliedAnnotations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppliedAnnotations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AppliedAnnotations::ResultId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AppliedAnnotations::AnnotationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AppliedAnnotations::Comment).text().not_null())
                    .col(ColumnDef::new(AppliedAnnotations::Filename).text().not_null())
                    .col(
                        ColumnDef::new(AppliedAnnotations::FirstLine)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AppliedAnnotations::LastLine)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AppliedAnnotations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AppliedAnnotations::Table, AppliedAnnotations::ResultId)
                            .to(HandgradingResults::Table, HandgradingResults::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AppliedAnnotations::Table, AppliedAnnotations::AnnotationId)
                            .to(Annotations::Table, Annotations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评语表
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comments::ResultId).big_integer().not_null())
                    .col(ColumnDef::new(Comments::Text).text().not_null())
                    .col(ColumnDef::new(Comments::Filename).text().null())
                    .col(ColumnDef::new(Comments::FirstLine).integer().null())
                    .col(ColumnDef::new(Comments::LastLine).integer().null())
                    .col(ColumnDef::new(Comments::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Comments::Table, Comments::ResultId)
                            .to(HandgradingResults::Table, HandgradingResults::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_criteria_rubric_id")
                    .table(Criteria::Table)
                    .col(Criteria::RubricId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_annotations_rubric_id")
                    .table(Annotations::Table)
                    .col(Annotations::RubricId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_criterion_results_result_id")
                    .table(CriterionResults::Table)
                    .col(CriterionResults::ResultId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applied_annotations_result_id")
                    .table(AppliedAnnotations::Table)
                    .col(AppliedAnnotations::ResultId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AppliedAnnotations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CriterionResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HandgradingResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Annotations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Criteria::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HandgradingRubrics::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Groups {
    #[sea_orm(iden = "groups")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum HandgradingRubrics {
    #[sea_orm(iden = "handgrading_rubrics")]
    Table,
    Id,
    ProjectId,
    PointsStyle,
    MaxPoints,
    ShowGradesAndRubricToStudents,
    ShowOnlyAppliedRubricToStudents,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Criteria {
    #[sea_orm(iden = "criteria")]
    Table,
    Id,
    RubricId,
    ShortDescription,
    LongDescription,
    Points,
    SortOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Annotations {
    #[sea_orm(iden = "annotations")]
    Table,
    Id,
    RubricId,
    ShortDescription,
    LongDescription,
    Deduction,
    MaxDeduction,
    SortOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HandgradingResults {
    #[sea_orm(iden = "handgrading_results")]
    Table,
    Id,
    RubricId,
    GroupId,
    SubmissionId,
    PointsAdjustment,
    FinishedGrading,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CriterionResults {
    #[sea_orm(iden = "criterion_results")]
    Table,
    Id,
    ResultId,
    CriterionId,
    Selected,
}

#[derive(DeriveIden)]
enum AppliedAnnotations {
    #[sea_orm(iden = "applied_annotations")]
    Table,
    Id,
    ResultId,
    AnnotationId,
    Comment,
    Filename,
    FirstLine,
    LastLine,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    #[sea_orm(iden = "comments")]
    Table,
    Id,
    ResultId,
    Text,
    Filename,
    FirstLine,
    LastLine,
    CreatedAt,
}
