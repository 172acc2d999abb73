use tracing::debug;

use super::{
    HandgradingService, compute_total_points, compute_total_points_possible,
    filter_for_unprivileged_viewer, score_cache_key,
};
use crate::cache::{get_json, insert_json};
use crate::config::AppConfig;
use crate::errors::{HWSystemError, Result};
use crate::models::handgrading::{
    entities::{HandgradingResult, HandgradingRubric},
    responses::{HandgradingResultResponse, HandgradingScoreSummary},
};

/// 按查看者身份返回评分结果
///
/// 分数总是基于完整数据计算；无特权查看者只能在
/// `show_grades_and_rubric_to_students` 开启后查看，
/// 且在 `show_only_applied_rubric_to_students` 开启时只看到实际用到的条目。
pub async fn get_result_for_viewer(
    service: &HandgradingService,
    result_id: i64,
    is_privileged_viewer: bool,
) -> Result<HandgradingResultResponse> {
    let result = service.load_result(result_id).await?;
    let rubric = service.load_rubric(result.rubric_id).await?;

    if !is_privileged_viewer && !rubric.show_grades_and_rubric_to_students {
        return Err(HWSystemError::authorization("评分结果尚未向学生公开"));
    }

    let total_points = compute_total_points(
        &rubric,
        &result.criterion_results,
        &result.applied_annotations,
        result.points_adjustment,
    );
    let total_points_possible = compute_total_points_possible(&rubric);

    let (result, rubric) = if !is_privileged_viewer && rubric.show_only_applied_rubric_to_students
    {
        filter_for_unprivileged_viewer(&result, &rubric)
    } else {
        (result, rubric)
    };

    Ok(HandgradingResultResponse {
        result,
        handgrading_rubric: rubric,
        total_points,
        total_points_possible,
    })
}

/// 评分汇总，命中缓存时不访问评分子记录
pub async fn score_summary(
    service: &HandgradingService,
    result_id: i64,
) -> Result<HandgradingScoreSummary> {
    let result = service.load_result(result_id).await?;
    let rubric = service.load_rubric(result.rubric_id).await?;

    let cache = service.get_cache();
    let key = score_cache_key(rubric.project_id, result.submission_id);

    if let Some(summary) = get_json::<HandgradingScoreSummary>(cache.as_ref(), &key).await {
        debug!("Score summary cache hit: {}", key);
        return Ok(summary);
    }

    debug!("Score summary cache miss: {}", key);

    let summary = summarize(&rubric, &result);

    insert_json(
        cache.as_ref(),
        key,
        &summary,
        AppConfig::get().cache.default_ttl,
    )
    .await?;

    Ok(summary)
}

/// 项目内所有小组的评分汇总，按结果创建顺序排列
pub async fn list_project_scores(
    service: &HandgradingService,
    project_id: i64,
) -> Result<Vec<HandgradingScoreSummary>> {
    let storage = service.get_storage();
    let rubric = storage
        .get_rubric_by_project(project_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("项目 {project_id} 没有评分细则")))?;

    let results = storage.list_handgrading_results_by_rubric(rubric.id).await?;
    debug!(
        "Listing {} handgrading scores for project {}",
        results.len(),
        project_id
    );

    Ok(results
        .iter()
        .map(|result| summarize(&rubric, result))
        .collect())
}

fn summarize(rubric: &HandgradingRubric, result: &HandgradingResult) -> HandgradingScoreSummary {
    HandgradingScoreSummary {
        result_id: result.id,
        group_id: result.group_id,
        submission_id: result.submission_id,
        finished_grading: result.finished_grading,
        total_points: compute_total_points(
            rubric,
            &result.criterion_results,
            &result.applied_annotations,
            result.points_adjustment,
        ),
        total_points_possible: compute_total_points_possible(rubric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheResult;
    use crate::models::handgrading::{
        entities::{HandgradingRubric, Location, PointsStyle},
        requests::{
            ApplyAnnotationRequest, CreateAnnotationRequest, CreateCriterionRequest,
            CreateHandgradingResultRequest, CreateRubricRequest, UpdateHandgradingResultRequest,
        },
    };
    use crate::models::groups::requests::{CreateGroupRequest, CreateSubmissionRequest};
    use crate::services::handgrading::test_support::{Fixture, fixture};

    async fn graded(fx: &Fixture, req: CreateRubricRequest) -> (HandgradingRubric, i64) {
        let rubric = fx.service.create_rubric(req).await.unwrap();
        let kept = fx
            .service
            .add_criterion(
                rubric.id,
                CreateCriterionRequest {
                    short_description: "tests pass".to_string(),
                    points: 4.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        fx.service
            .add_criterion(
                rubric.id,
                CreateCriterionRequest {
                    short_description: "style".to_string(),
                    points: 2.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let annotation = fx
            .service
            .add_annotation(
                rubric.id,
                CreateAnnotationRequest {
                    short_description: "leak".to_string(),
                    deduction: -1.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        fx.service
            .add_annotation(
                rubric.id,
                CreateAnnotationRequest {
                    short_description: "unused".to_string(),
                    deduction: -5.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = fx
            .service
            .create_result(CreateHandgradingResultRequest {
                rubric_id: rubric.id,
                group_id: fx.group.id,
                submission_id: fx.submission.id,
            })
            .await
            .unwrap();

        let cr = result
            .criterion_results
            .iter()
            .find(|cr| cr.criterion_id == kept.id)
            .unwrap();
        fx.service.select_criterion(cr.id, true).await.unwrap();
        fx.service
            .apply_annotation(
                result.id,
                ApplyAnnotationRequest {
                    annotation_id: annotation.id,
                    location: Location {
                        filename: "main.cpp".to_string(),
                        first_line: 10,
                        last_line: 12,
                    },
                    comment: String::new(),
                },
            )
            .await
            .unwrap();

        (fx.service.load_rubric(rubric.id).await.unwrap(), result.id)
    }

    #[tokio::test]
    async fn test_unreleased_result_is_hidden_from_students() {
        let fx = fixture().await;
        let (_, result_id) = graded(
            &fx,
            CreateRubricRequest {
                project_id: 7,
                ..Default::default()
            },
        )
        .await;

        let err = fx
            .service
            .get_result_for_viewer(result_id, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");

        let staff_view = fx
            .service
            .get_result_for_viewer(result_id, true)
            .await
            .unwrap();
        assert_eq!(staff_view.total_points, 3.0);
        assert_eq!(staff_view.total_points_possible, 6.0);
    }

    #[tokio::test]
    async fn test_students_see_only_applied_items_with_full_score() {
        let fx = fixture().await;
        let (rubric, result_id) = graded(
            &fx,
            CreateRubricRequest {
                project_id: 7,
                show_grades_and_rubric_to_students: true,
                show_only_applied_rubric_to_students: true,
                ..Default::default()
            },
        )
        .await;

        let student_view = fx
            .service
            .get_result_for_viewer(result_id, false)
            .await
            .unwrap();
        assert_eq!(student_view.handgrading_rubric.criteria.len(), 1);
        assert_eq!(student_view.handgrading_rubric.annotations.len(), 1);
        assert_eq!(student_view.result.criterion_results.len(), 1);
        // 分数按完整细则计算
        assert_eq!(student_view.total_points, 3.0);
        assert_eq!(student_view.total_points_possible, 6.0);

        let staff_view = fx
            .service
            .get_result_for_viewer(result_id, true)
            .await
            .unwrap();
        assert_eq!(staff_view.handgrading_rubric, rubric);
        assert_eq!(staff_view.result.criterion_results.len(), 2);
    }

    #[tokio::test]
    async fn test_released_result_without_filter_shows_everything() {
        let fx = fixture().await;
        let (rubric, result_id) = graded(
            &fx,
            CreateRubricRequest {
                project_id: 7,
                show_grades_and_rubric_to_students: true,
                ..Default::default()
            },
        )
        .await;

        let student_view = fx
            .service
            .get_result_for_viewer(result_id, false)
            .await
            .unwrap();
        assert_eq!(student_view.handgrading_rubric, rubric);
    }

    #[tokio::test]
    async fn test_score_summary_is_cached_and_invalidated() {
        let fx = fixture().await;
        let (rubric, result_id) = graded(
            &fx,
            CreateRubricRequest {
                project_id: 7,
                points_style: PointsStyle::StartAtZeroAndAdd,
                ..Default::default()
            },
        )
        .await;

        let summary = fx.service.score_summary(result_id).await.unwrap();
        assert_eq!(summary.total_points, 3.0);
        assert!(!summary.finished_grading);

        let key = score_cache_key(rubric.project_id, fx.submission.id);
        assert!(matches!(
            fx.cache.get_raw(&key).await,
            CacheResult::Found(_)
        ));

        fx.service
            .update_result(
                result_id,
                UpdateHandgradingResultRequest {
                    points_adjustment: Some(1.5),
                    finished_grading: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(fx.cache.get_raw(&key).await, CacheResult::NotFound);

        let summary = fx.service.score_summary(result_id).await.unwrap();
        assert_eq!(summary.total_points, 4.5);
        assert!(summary.finished_grading);
    }

    #[tokio::test]
    async fn test_list_project_scores() {
        let fx = fixture().await;
        let (rubric, first_id) = graded(
            &fx,
            CreateRubricRequest {
                project_id: 7,
                ..Default::default()
            },
        )
        .await;

        let other = fx
            .storage
            .create_group(CreateGroupRequest {
                project_id: 7,
                member_names: vec!["carol".to_string()],
            })
            .await
            .unwrap();
        let other_submission = fx
            .storage
            .create_submission(CreateSubmissionRequest {
                group_id: other.id,
                submitted_filenames: vec!["main.cpp".to_string()],
                submitted_at: None,
            })
            .await
            .unwrap();
        let second = fx
            .service
            .create_result(CreateHandgradingResultRequest {
                rubric_id: rubric.id,
                group_id: other.id,
                submission_id: other_submission.id,
            })
            .await
            .unwrap();
        fx.service
            .update_result(
                second.id,
                UpdateHandgradingResultRequest {
                    points_adjustment: Some(1.5),
                    finished_grading: Some(true),
                },
            )
            .await
            .unwrap();

        let scores = fx.service.list_project_scores(7).await.unwrap();
        assert_eq!(scores.len(), 2);

        assert_eq!(scores[0].result_id, first_id);
        assert_eq!(scores[0].group_id, fx.group.id);
        assert_eq!(scores[0].total_points, 3.0);
        assert_eq!(scores[0].total_points_possible, 6.0);
        assert!(!scores[0].finished_grading);

        assert_eq!(scores[1].result_id, second.id);
        assert_eq!(scores[1].group_id, other.id);
        assert_eq!(scores[1].total_points, 1.5);
        assert!(scores[1].finished_grading);

        // 与单个结果的汇总一致
        assert_eq!(
            fx.service.score_summary(first_id).await.unwrap(),
            scores[0]
        );

        let err = fx.service.list_project_scores(99).await.unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}

