//! 学生视角的评分细则过滤

use std::collections::HashSet;

use crate::models::handgrading::entities::{HandgradingResult, HandgradingRubric};

/// 只保留实际选中的评分项和实际应用过的批注
///
/// 仅在 `show_only_applied_rubric_to_students` 开启且查看者无特权时使用。
/// 纯投影，重复调用结果不变。
pub fn filter_for_unprivileged_viewer(
    result: &HandgradingResult,
    rubric: &HandgradingRubric,
) -> (HandgradingResult, HandgradingRubric) {
    let selected_criteria: HashSet<i64> = result
        .criterion_results
        .iter()
        .filter(|cr| cr.selected)
        .map(|cr| cr.criterion_id)
        .collect();

    let applied_annotations: HashSet<i64> = result
        .applied_annotations
        .iter()
        .map(|applied| applied.annotation_id)
        .collect();

    let mut filtered_rubric = rubric.clone();
    filtered_rubric
        .criteria
        .retain(|c| selected_criteria.contains(&c.id));
    filtered_rubric
        .annotations
        .retain(|a| applied_annotations.contains(&a.id));

    let mut filtered_result = result.clone();
    filtered_result
        .criterion_results
        .retain(|cr| selected_criteria.contains(&cr.criterion_id));
    filtered_result
        .applied_annotations
        .retain(|applied| applied_annotations.contains(&applied.annotation_id));

    (filtered_result, filtered_rubric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::handgrading::entities::{Comment, PointsStyle};
    use crate::services::handgrading::score::tests::{
        annotation, applied_annotation, criterion, criterion_result, rubric,
    };

    fn sample() -> (HandgradingResult, HandgradingRubric) {
        let rubric = rubric(
            PointsStyle::StartAtZeroAndAdd,
            None,
            vec![criterion(1, 2.0), criterion(2, 3.0), criterion(3, 1.0)],
            vec![annotation(10, -1.0, None), annotation(11, -2.0, Some(-4.0))],
        );
        let result = HandgradingResult {
            id: 1,
            rubric_id: rubric.id,
            group_id: 1,
            submission_id: 1,
            finished_grading: true,
            points_adjustment: 1.5,
            criterion_results: vec![
                criterion_result(100, 1, true),
                criterion_result(101, 2, false),
                criterion_result(102, 3, true),
            ],
            applied_annotations: vec![applied_annotation(200, 11), applied_annotation(201, 11)],
            comments: vec![Comment {
                id: 300,
                result_id: 1,
                location: None,
                text: "nice work".to_string(),
            }],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        (result, rubric)
    }

    #[test]
    fn test_filter_keeps_selected_and_applied_items() {
        let (result, rubric) = sample();
        let (filtered_result, filtered_rubric) = filter_for_unprivileged_viewer(&result, &rubric);

        let criterion_ids: Vec<i64> = filtered_rubric.criteria.iter().map(|c| c.id).collect();
        assert_eq!(criterion_ids, vec![1, 3]);
        let annotation_ids: Vec<i64> = filtered_rubric.annotations.iter().map(|a| a.id).collect();
        assert_eq!(annotation_ids, vec![11]);

        let cr_ids: Vec<i64> = filtered_result
            .criterion_results
            .iter()
            .map(|cr| cr.id)
            .collect();
        assert_eq!(cr_ids, vec![100, 102]);
        assert_eq!(filtered_result.applied_annotations.len(), 2);
    }

    #[test]
    fn test_filter_passes_other_fields_through() {
        let (result, rubric) = sample();
        let (filtered_result, filtered_rubric) = filter_for_unprivileged_viewer(&result, &rubric);

        assert_eq!(filtered_result.points_adjustment, result.points_adjustment);
        assert_eq!(filtered_result.finished_grading, result.finished_grading);
        assert_eq!(filtered_result.comments, result.comments);
        assert_eq!(filtered_rubric.points_style, rubric.points_style);
        assert_eq!(filtered_rubric.max_points, rubric.max_points);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let (result, rubric) = sample();
        let once = filter_for_unprivileged_viewer(&result, &rubric);
        let twice = filter_for_unprivileged_viewer(&once.0, &once.1);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_on_ungraded_result_hides_everything() {
        let (mut result, rubric) = sample();
        result.criterion_results.iter_mut().for_each(|cr| cr.selected = false);
        result.applied_annotations.clear();

        let (filtered_result, filtered_rubric) = filter_for_unprivileged_viewer(&result, &rubric);
        assert!(filtered_rubric.criteria.is_empty());
        assert!(filtered_rubric.annotations.is_empty());
        assert!(filtered_result.criterion_results.is_empty());
    }
}
