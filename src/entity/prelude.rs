//! 预导入模块，方便使用

pub use super::annotations::{
    ActiveModel as AnnotationActiveModel, Entity as Annotations, Model as AnnotationModel,
};
pub use super::applied_annotations::{
    ActiveModel as AppliedAnnotationActiveModel, Entity as AppliedAnnotations,
    Model as AppliedAnnotationModel,
};
pub use super::comments::{
    ActiveModel as CommentActiveModel, Entity as Comments, Model as CommentModel,
};
pub use super::criteria::{
    ActiveModel as CriterionActiveModel, Entity as Criteria, Model as CriterionModel,
};
pub use super::criterion_results::{
    ActiveModel as CriterionResultActiveModel, Entity as CriterionResults,
    Model as CriterionResultModel,
};
pub use super::groups::{ActiveModel as GroupActiveModel, Entity as Groups, Model as GroupModel};
pub use super::handgrading_results::{
    ActiveModel as HandgradingResultActiveModel, Entity as HandgradingResults,
    Model as HandgradingResultModel,
};
pub use super::handgrading_rubrics::{
    ActiveModel as HandgradingRubricActiveModel, Entity as HandgradingRubrics,
    Model as HandgradingRubricModel,
};
pub use super::hint_configs::{
    ActiveModel as HintConfigActiveModel, Entity as HintConfigs, Model as HintConfigModel,
};
pub use super::mutation_test_suite_results::{
    ActiveModel as MutationTestSuiteResultActiveModel, Entity as MutationTestSuiteResults,
    Model as MutationTestSuiteResultModel,
};
pub use super::mutation_test_suites::{
    ActiveModel as MutationTestSuiteActiveModel, Entity as MutationTestSuites,
    Model as MutationTestSuiteModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::unlocked_hints::{
    ActiveModel as UnlockedHintActiveModel, Entity as UnlockedHints, Model as UnlockedHintModel,
};
