use tracing::{debug, info};

use super::{HandgradingService, validate_location};
use crate::errors::{HWSystemError, Result};
use crate::models::handgrading::{
    entities::{AppliedAnnotation, Comment, CriterionResult, HandgradingResult},
    requests::{
        ApplyAnnotationRequest, CreateCommentRequest, CreateHandgradingResultRequest,
        UpdateCommentRequest, UpdateHandgradingResultRequest,
    },
};

/// 获取或创建小组的评分结果
///
/// 小组已有结果时返回该结果（不更换提交），并为之后新增的评分项补齐评分项结果。
pub async fn create_result(
    service: &HandgradingService,
    req: CreateHandgradingResultRequest,
) -> Result<HandgradingResult> {
    let storage = service.get_storage();
    let rubric = service.load_rubric(req.rubric_id).await?;
    let group = storage
        .get_group_by_id(req.group_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("小组 {} 不存在", req.group_id)))?;

    if group.project_id != rubric.project_id {
        return Err(HWSystemError::validation(format!(
            "小组 {} 属于项目 {}，评分细则 {} 属于项目 {}",
            group.id, group.project_id, rubric.id, rubric.project_id
        )));
    }

    let submission = service.load_submission(req.submission_id).await?;
    if submission.group_id != group.id {
        return Err(HWSystemError::validation(format!(
            "提交 {} 不属于小组 {}",
            submission.id, group.id
        )));
    }

    let (result, created) = storage.create_handgrading_result(req).await?;

    if created {
        info!(
            "Handgrading result {} created for group {} submission {}",
            result.id, result.group_id, result.submission_id
        );
    } else {
        debug!(
            "Handgrading result {} already exists for group {}",
            result.id, result.group_id
        );
    }
    Ok(result)
}

pub async fn update_result(
    service: &HandgradingService,
    result_id: i64,
    update: UpdateHandgradingResultRequest,
) -> Result<HandgradingResult> {
    let result = service
        .get_storage()
        .update_handgrading_result(result_id, update)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("评分结果 {result_id} 不存在")))?;

    service.invalidate_score(&result).await?;
    Ok(result)
}

pub async fn select_criterion(
    service: &HandgradingService,
    criterion_result_id: i64,
    selected: bool,
) -> Result<CriterionResult> {
    let criterion_result = service
        .get_storage()
        .update_criterion_result(criterion_result_id, selected)
        .await?
        .ok_or_else(|| {
            HWSystemError::not_found(format!("评分项结果 {criterion_result_id} 不存在"))
        })?;

    let result = service.load_result(criterion_result.result_id).await?;
    service.invalidate_score(&result).await?;

    debug!(
        "Criterion result {} set to selected={}",
        criterion_result_id, selected
    );
    Ok(criterion_result)
}

pub async fn apply_annotation(
    service: &HandgradingService,
    result_id: i64,
    req: ApplyAnnotationRequest,
) -> Result<AppliedAnnotation> {
    let result = service.load_result(result_id).await?;

    let annotation = service
        .get_storage()
        .get_annotation_by_id(req.annotation_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("批注 {} 不存在", req.annotation_id)))?;

    if annotation.rubric_id != result.rubric_id {
        return Err(HWSystemError::validation(format!(
            "批注 {} 不属于评分细则 {}",
            annotation.id, result.rubric_id
        )));
    }

    let submission = service.load_submission(result.submission_id).await?;
    validate_location(&req.location, &submission)?;

    let applied = service
        .get_storage()
        .create_applied_annotation(result_id, req)
        .await?;

    service.invalidate_score(&result).await?;
    Ok(applied)
}

pub async fn remove_applied_annotation(
    service: &HandgradingService,
    applied_annotation_id: i64,
) -> Result<()> {
    let storage = service.get_storage();

    let applied = storage
        .get_applied_annotation_by_id(applied_annotation_id)
        .await?
        .ok_or_else(|| {
            HWSystemError::not_found(format!("已应用批注 {applied_annotation_id} 不存在"))
        })?;

    storage
        .delete_applied_annotation(applied_annotation_id)
        .await?;

    let result = service.load_result(applied.result_id).await?;
    service.invalidate_score(&result).await?;
    Ok(())
}

pub async fn add_comment(
    service: &HandgradingService,
    result_id: i64,
    req: CreateCommentRequest,
) -> Result<Comment> {
    let result = service.load_result(result_id).await?;

    if let Some(location) = &req.location {
        let submission = service.load_submission(result.submission_id).await?;
        validate_location(location, &submission)?;
    }

    service
        .get_storage()
        .create_comment(result_id, req)
        .await
}

pub async fn update_comment(
    service: &HandgradingService,
    comment_id: i64,
    update: UpdateCommentRequest,
) -> Result<Comment> {
    let storage = service.get_storage();
    let comment = storage
        .get_comment_by_id(comment_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("评语 {comment_id} 不存在")))?;

    if let Some(Some(location)) = &update.location {
        let result = service.load_result(comment.result_id).await?;
        let submission = service.load_submission(result.submission_id).await?;
        validate_location(location, &submission)?;
    }

    storage
        .update_comment(comment_id, update)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("评语 {comment_id} 不存在")))
}

pub async fn delete_comment(service: &HandgradingService, comment_id: i64) -> Result<()> {
    if !service.get_storage().delete_comment(comment_id).await? {
        return Err(HWSystemError::not_found(format!("评语 {comment_id} 不存在")));
    }
    Ok(())
}
