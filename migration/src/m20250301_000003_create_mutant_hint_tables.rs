use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建变异测试套件表
        manager
            .create_table(
                Table::create()
                    .table(MutationTestSuites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MutationTestSuites::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MutationTestSuites::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MutationTestSuites::Name).string().not_null())
                    .col(
                        ColumnDef::new(MutationTestSuites::BuggyImplNames)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MutationTestSuites::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建变异测试结果表
        manager
            .create_table(
                Table::create()
                    .table(MutationTestSuiteResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MutationTestSuiteResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MutationTestSuiteResults::MutationTestSuiteId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MutationTestSuiteResults::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MutationTestSuiteResults::BugsExposed)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MutationTestSuiteResults::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                MutationTestSuiteResults::Table,
                                MutationTestSuiteResults::MutationTestSuiteId,
                            )
                            .to(MutationTestSuites::Table, MutationTestSuites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                MutationTestSuiteResults::Table,
                                MutationTestSuiteResults::SubmissionId,
                            )
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建提示配置表（每个套件至多一份）
        manager
            .create_table(
                Table::create()
                    .table(HintConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HintConfigs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::MutationTestSuiteId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::HintsByMutantName)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HintConfigs::NumHintsPerDay).integer().null())
                    .col(
                        ColumnDef::new(HintConfigs::NumHintsPerSubmission)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::HintLimitResetTime)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::HintLimitResetTimezone)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::ObfuscateMutantNames)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::ObfuscatedMutantNamePrefix)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HintConfigs::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(HintConfigs::Table, HintConfigs::MutationTestSuiteId)
                            .to(MutationTestSuites::Table, MutationTestSuites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建已解锁提示表（只追加）
        manager
            .create_table(
                Table::create()
                    .table(UnlockedHints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UnlockedHints::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UnlockedHints::MutationTestSuiteResultId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UnlockedHints::HintConfigId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UnlockedHints::MutantName).string().not_null())
                    .col(ColumnDef::new(UnlockedHints::HintNumber).integer().not_null())
                    .col(ColumnDef::new(UnlockedHints::HintText).text().not_null())
                    .col(ColumnDef::new(UnlockedHints::UnlockedBy).string().not_null())
                    .col(ColumnDef::new(UnlockedHints::HintRating).integer().null())
                    .col(ColumnDef::new(UnlockedHints::RatedBy).string().not_null())
                    .col(ColumnDef::new(UnlockedHints::UserComment).text().not_null())
                    .col(
                        ColumnDef::new(UnlockedHints::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UnlockedHints::Table, UnlockedHints::MutationTestSuiteResultId)
                            .to(MutationTestSuiteResults::Table, MutationTestSuiteResults::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UnlockedHints::Table, UnlockedHints::HintConfigId)
                            .to(HintConfigs::Table, HintConfigs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mutation_test_suite_results_submission_id")
                    .table(MutationTestSuiteResults::Table)
                    .col(MutationTestSuiteResults::SubmissionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_unlocked_hints_result_id")
                    .table(UnlockedHints::Table)
                    .col(UnlockedHints::MutationTestSuiteResultId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_unlocked_hints_mutant_name")
                    .table(UnlockedHints::Table)
                    .col(UnlockedHints::MutantName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_unlocked_hints_created_at")
                    .table(UnlockedHints::Table)
                    .col(UnlockedHints::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UnlockedHints::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HintConfigs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MutationTestSuiteResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MutationTestSuites::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MutationTestSuites {
    #[sea_orm(iden = "mutation_test_suites")]
    Table,
    Id,
    ProjectId,
    Name,
    BuggyImplNames,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MutationTestSuiteResults {
    #[sea_orm(iden = "mutation_test_suite_results")]
    Table,
    Id,
    MutationTestSuiteId,
    SubmissionId,
    BugsExposed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HintConfigs {
    #[sea_orm(iden = "mutation_test_suite_hint_configs")]
    Table,
    Id,
    MutationTestSuiteId,
    HintsByMutantName,
    NumHintsPerDay,
    NumHintsPerSubmission,
    HintLimitResetTime,
    HintLimitResetTimezone,
    ObfuscateMutantNames,
    ObfuscatedMutantNamePrefix,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UnlockedHints {
    #[sea_orm(iden = "unlocked_hints")]
    Table,
    Id,
    MutationTestSuiteResultId,
    HintConfigId,
    MutantName,
    HintNumber,
    HintText,
    UnlockedBy,
    HintRating,
    RatedBy,
    UserComment,
    CreatedAt,
}
