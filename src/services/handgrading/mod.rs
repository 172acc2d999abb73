pub mod grading;
pub mod rubric;
pub mod score;
pub mod view;
pub mod visibility;

use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::{HWSystemError, Result};
use crate::models::groups::entities::Submission;
use crate::models::handgrading::{
    entities::{
        AppliedAnnotation, Annotation, Comment, Criterion, CriterionResult, HandgradingResult,
        HandgradingRubric, Location,
    },
    requests::{
        ApplyAnnotationRequest, CreateAnnotationRequest, CreateCommentRequest,
        CreateCriterionRequest, CreateHandgradingResultRequest, CreateRubricRequest,
        UpdateAnnotationRequest, UpdateCommentRequest, UpdateCriterionRequest,
        UpdateHandgradingResultRequest, UpdateRubricRequest,
    },
    responses::{HandgradingResultResponse, HandgradingScoreSummary},
};
use crate::storage::Storage;

pub use score::{compute_total_points, compute_total_points_possible};
pub use visibility::filter_for_unprivileged_viewer;

/// 评分汇总的缓存键
pub fn score_cache_key(project_id: i64, submission_id: i64) -> String {
    format!("handgrading_score:{project_id}:{submission_id}")
}

pub struct HandgradingService {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
}

impl HandgradingService {
    pub fn new(storage: Arc<dyn Storage>, cache: Arc<dyn ObjectCache>) -> Self {
        Self { storage, cache }
    }

    pub(crate) fn get_storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    pub(crate) fn get_cache(&self) -> Arc<dyn ObjectCache> {
        self.cache.clone()
    }

    // 创建评分细则
    pub async fn create_rubric(&self, req: CreateRubricRequest) -> Result<HandgradingRubric> {
        rubric::create_rubric(self, req).await
    }

    // 更新评分细则
    pub async fn update_rubric(
        &self,
        rubric_id: i64,
        update: UpdateRubricRequest,
    ) -> Result<HandgradingRubric> {
        rubric::update_rubric(self, rubric_id, update).await
    }

    // 添加评分项
    pub async fn add_criterion(
        &self,
        rubric_id: i64,
        req: CreateCriterionRequest,
    ) -> Result<Criterion> {
        rubric::add_criterion(self, rubric_id, req).await
    }

    // 添加批注
    pub async fn add_annotation(
        &self,
        rubric_id: i64,
        req: CreateAnnotationRequest,
    ) -> Result<Annotation> {
        rubric::add_annotation(self, rubric_id, req).await
    }

    // 修改评分项
    pub async fn update_criterion(
        &self,
        criterion_id: i64,
        update: UpdateCriterionRequest,
    ) -> Result<Criterion> {
        rubric::update_criterion(self, criterion_id, update).await
    }

    // 删除评分项
    pub async fn delete_criterion(&self, criterion_id: i64) -> Result<()> {
        rubric::delete_criterion(self, criterion_id).await
    }

    // 修改批注
    pub async fn update_annotation(
        &self,
        annotation_id: i64,
        update: UpdateAnnotationRequest,
    ) -> Result<Annotation> {
        rubric::update_annotation(self, annotation_id, update).await
    }

    // 删除批注
    pub async fn delete_annotation(&self, annotation_id: i64) -> Result<()> {
        rubric::delete_annotation(self, annotation_id).await
    }

    // 为小组开始人工评分，已有结果时直接返回
    pub async fn create_result(
        &self,
        req: CreateHandgradingResultRequest,
    ) -> Result<HandgradingResult> {
        grading::create_result(self, req).await
    }

    // 更新分数调整和完成标记
    pub async fn update_result(
        &self,
        result_id: i64,
        update: UpdateHandgradingResultRequest,
    ) -> Result<HandgradingResult> {
        grading::update_result(self, result_id, update).await
    }

    // 选中/取消选中评分项
    pub async fn select_criterion(
        &self,
        criterion_result_id: i64,
        selected: bool,
    ) -> Result<CriterionResult> {
        grading::select_criterion(self, criterion_result_id, selected).await
    }

    // 在代码位置上应用批注
    pub async fn apply_annotation(
        &self,
        result_id: i64,
        req: ApplyAnnotationRequest,
    ) -> Result<AppliedAnnotation> {
        grading::apply_annotation(self, result_id, req).await
    }

    // 移除已应用的批注
    pub async fn remove_applied_annotation(&self, applied_annotation_id: i64) -> Result<()> {
        grading::remove_applied_annotation(self, applied_annotation_id).await
    }

    // 添加评语
    pub async fn add_comment(&self, result_id: i64, req: CreateCommentRequest) -> Result<Comment> {
        grading::add_comment(self, result_id, req).await
    }

    // 修改评语
    pub async fn update_comment(
        &self,
        comment_id: i64,
        update: UpdateCommentRequest,
    ) -> Result<Comment> {
        grading::update_comment(self, comment_id, update).await
    }

    // 删除评语
    pub async fn delete_comment(&self, comment_id: i64) -> Result<()> {
        grading::delete_comment(self, comment_id).await
    }

    // 按查看者身份返回评分结果
    pub async fn get_result_for_viewer(
        &self,
        result_id: i64,
        is_privileged_viewer: bool,
    ) -> Result<HandgradingResultResponse> {
        view::get_result_for_viewer(self, result_id, is_privileged_viewer).await
    }

    // 评分汇总（带缓存）
    pub async fn score_summary(&self, result_id: i64) -> Result<HandgradingScoreSummary> {
        view::score_summary(self, result_id).await
    }

    // 项目内全部评分汇总
    pub async fn list_project_scores(
        &self,
        project_id: i64,
    ) -> Result<Vec<HandgradingScoreSummary>> {
        view::list_project_scores(self, project_id).await
    }

    pub(crate) async fn load_result(&self, result_id: i64) -> Result<HandgradingResult> {
        self.storage
            .get_handgrading_result_by_id(result_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("评分结果 {result_id} 不存在")))
    }

    pub(crate) async fn load_rubric(&self, rubric_id: i64) -> Result<HandgradingRubric> {
        self.storage
            .get_rubric_by_id(rubric_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("评分细则 {rubric_id} 不存在")))
    }

    pub(crate) async fn load_submission(&self, submission_id: i64) -> Result<Submission> {
        self.storage
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("提交 {submission_id} 不存在")))
    }

    // 使某个评分结果的汇总缓存失效
    pub(crate) async fn invalidate_score(&self, result: &HandgradingResult) -> Result<()> {
        let rubric = self.load_rubric(result.rubric_id).await?;
        self.cache
            .remove(&score_cache_key(rubric.project_id, result.submission_id))
            .await;
        Ok(())
    }
}

/// 批注和评语的位置必须落在提交的文件内
pub(crate) fn validate_location(location: &Location, submission: &Submission) -> Result<()> {
    if location.first_line < 0 {
        return Err(HWSystemError::validation("起始行号不能为负数"));
    }

    if location.last_line < location.first_line {
        return Err(HWSystemError::validation("结束行号不能小于起始行号"));
    }

    if !submission.submitted_filenames.contains(&location.filename) {
        return Err(HWSystemError::validation(format!(
            "文件 {} 不在该提交中",
            location.filename
        )));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::HandgradingService;
    use crate::cache::{MokaCacheWrapper, ObjectCache};
    use crate::models::groups::{
        entities::{Group, Submission},
        requests::{CreateGroupRequest, CreateSubmissionRequest},
    };
    use crate::storage::{Storage, memory_storage};

    pub(crate) struct Fixture {
        pub storage: Arc<dyn Storage>,
        pub cache: Arc<dyn ObjectCache>,
        pub service: HandgradingService,
        pub group: Group,
        pub submission: Submission,
    }

    pub(crate) async fn fixture() -> Fixture {
        let storage = memory_storage().await;
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new(100, 60));
        let service = HandgradingService::new(storage.clone(), cache.clone());

        let group = storage
            .create_group(CreateGroupRequest {
                project_id: 7,
                member_names: vec!["alice".to_string(), "bob".to_string()],
            })
            .await
            .unwrap();
        let submission = storage
            .create_submission(CreateSubmissionRequest {
                group_id: group.id,
                submitted_filenames: vec!["main.cpp".to_string(), "util.h".to_string()],
                submitted_at: None,
            })
            .await
            .unwrap();

        Fixture {
            storage,
            cache,
            service,
            group,
            submission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> Submission {
        Submission {
            id: 1,
            group_id: 1,
            submitted_filenames: vec!["main.cpp".to_string()],
            submitted_at: chrono::Utc::now(),
        }
    }

    fn location(filename: &str, first_line: i32, last_line: i32) -> Location {
        Location {
            filename: filename.to_string(),
            first_line,
            last_line,
        }
    }

    #[test]
    fn test_score_cache_key() {
        assert_eq!(score_cache_key(3, 42), "handgrading_score:3:42");
    }

    #[test]
    fn test_validate_location() {
        let submission = submission();

        assert!(validate_location(&location("main.cpp", 0, 0), &submission).is_ok());
        assert!(validate_location(&location("main.cpp", 3, 10), &submission).is_ok());

        let err = validate_location(&location("main.cpp", -1, 2), &submission).unwrap_err();
        assert_eq!(err.code(), "E007");
        let err = validate_location(&location("main.cpp", 5, 4), &submission).unwrap_err();
        assert_eq!(err.code(), "E007");
        let err = validate_location(&location("other.cpp", 0, 1), &submission).unwrap_err();
        assert!(err.message().contains("other.cpp"));
    }
}
