use tracing::info;

use super::HandgradingService;
use crate::errors::{HWSystemError, Result};
use crate::models::handgrading::{
    entities::{Annotation, Criterion, HandgradingRubric, PointsStyle},
    requests::{
        CreateAnnotationRequest, CreateCriterionRequest, CreateRubricRequest,
        UpdateAnnotationRequest, UpdateCriterionRequest, UpdateRubricRequest,
    },
};

pub async fn create_rubric(
    service: &HandgradingService,
    req: CreateRubricRequest,
) -> Result<HandgradingRubric> {
    validate_points(req.points_style, req.max_points)?;

    let storage = service.get_storage();
    if storage.get_rubric_by_project(req.project_id).await?.is_some() {
        return Err(HWSystemError::validation(format!(
            "项目 {} 已存在评分细则",
            req.project_id
        )));
    }

    let rubric = storage.create_rubric(req).await?;
    info!(
        "Handgrading rubric {} created for project {}",
        rubric.id, rubric.project_id
    );
    Ok(rubric)
}

pub async fn update_rubric(
    service: &HandgradingService,
    rubric_id: i64,
    update: UpdateRubricRequest,
) -> Result<HandgradingRubric> {
    let existing = service.load_rubric(rubric_id).await?;

    // 按更新后的状态校验，`Some(None)` 表示清除满分
    validate_points(
        update.points_style.unwrap_or(existing.points_style),
        update.max_points.unwrap_or(existing.max_points),
    )?;

    let rubric = service
        .get_storage()
        .update_rubric(rubric_id, update)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("评分细则 {rubric_id} 不存在")))?;

    service.get_cache().invalidate_all().await;
    Ok(rubric)
}

pub async fn add_criterion(
    service: &HandgradingService,
    rubric_id: i64,
    req: CreateCriterionRequest,
) -> Result<Criterion> {
    service.load_rubric(rubric_id).await?;

    let criterion = service
        .get_storage()
        .create_criterion(rubric_id, req)
        .await?;

    service.get_cache().invalidate_all().await;
    Ok(criterion)
}

pub async fn add_annotation(
    service: &HandgradingService,
    rubric_id: i64,
    req: CreateAnnotationRequest,
) -> Result<Annotation> {
    validate_deductions(req.deduction, req.max_deduction)?;
    service.load_rubric(rubric_id).await?;

    let annotation = service
        .get_storage()
        .create_annotation(rubric_id, req)
        .await?;

    service.get_cache().invalidate_all().await;
    Ok(annotation)
}

pub async fn update_criterion(
    service: &HandgradingService,
    criterion_id: i64,
    update: UpdateCriterionRequest,
) -> Result<Criterion> {
    let criterion = service
        .get_storage()
        .update_criterion(criterion_id, update)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("评分项 {criterion_id} 不存在")))?;

    service.get_cache().invalidate_all().await;
    Ok(criterion)
}

pub async fn delete_criterion(service: &HandgradingService, criterion_id: i64) -> Result<()> {
    if !service.get_storage().delete_criterion(criterion_id).await? {
        return Err(HWSystemError::not_found(format!("评分项 {criterion_id} 不存在")));
    }

    service.get_cache().invalidate_all().await;
    info!("Criterion {} deleted with its criterion results", criterion_id);
    Ok(())
}

pub async fn update_annotation(
    service: &HandgradingService,
    annotation_id: i64,
    update: UpdateAnnotationRequest,
) -> Result<Annotation> {
    let storage = service.get_storage();
    let existing = storage
        .get_annotation_by_id(annotation_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("批注 {annotation_id} 不存在")))?;

    validate_deductions(
        update.deduction.unwrap_or(existing.deduction),
        update.max_deduction.unwrap_or(existing.max_deduction),
    )?;

    let annotation = storage
        .update_annotation(annotation_id, update)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("批注 {annotation_id} 不存在")))?;

    service.get_cache().invalidate_all().await;
    Ok(annotation)
}

pub async fn delete_annotation(service: &HandgradingService, annotation_id: i64) -> Result<()> {
    if !service.get_storage().delete_annotation(annotation_id).await? {
        return Err(HWSystemError::not_found(format!("批注 {annotation_id} 不存在")));
    }

    service.get_cache().invalidate_all().await;
    info!("Annotation {} deleted with its applications", annotation_id);
    Ok(())
}

fn validate_deductions(deduction: f64, max_deduction: Option<f64>) -> Result<()> {
    if deduction > 0.0 {
        return Err(HWSystemError::validation("批注扣分必须小于等于 0"));
    }

    if let Some(max_deduction) = max_deduction
        && max_deduction > 0.0
    {
        return Err(HWSystemError::validation("批注扣分上限必须小于等于 0"));
    }

    Ok(())
}

fn validate_points(points_style: PointsStyle, max_points: Option<f64>) -> Result<()> {
    if let Some(max_points) = max_points
        && max_points < 0.0
    {
        return Err(HWSystemError::validation("满分不能为负数"));
    }

    if points_style == PointsStyle::StartAtMaxAndSubtract && max_points.is_none() {
        return Err(HWSystemError::validation(
            "start_at_max_and_subtract 计分方式必须设置满分",
        ));
    }

    Ok(())
}
