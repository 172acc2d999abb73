//! 人工评分计分
//!
//! 纯函数，不做任何 I/O，也不校验引用完整性（由录入环节保证）。

use crate::models::handgrading::entities::{
    AppliedAnnotation, CriterionResult, HandgradingRubric, PointsStyle,
};

/// 计算得分
///
/// 1. `start_at_max_and_subtract` 从 `max_points` 起算，否则从 0 起算
/// 2. 每个批注按应用次数累计扣分，设置了 `max_deduction` 时不低于该值
/// 3. 加上所有选中评分项的分值（可为负）
/// 4. 加上 `points_adjustment`
/// 5. 结果不小于 0
pub fn compute_total_points(
    rubric: &HandgradingRubric,
    criterion_results: &[CriterionResult],
    applied_annotations: &[AppliedAnnotation],
    points_adjustment: f64,
) -> f64 {
    let mut total = match rubric.points_style {
        PointsStyle::StartAtMaxAndSubtract => rubric.max_points.unwrap_or(0.0),
        PointsStyle::StartAtZeroAndAdd => 0.0,
    };

    for annotation in &rubric.annotations {
        let raw: f64 = applied_annotations
            .iter()
            .filter(|applied| applied.annotation_id == annotation.id)
            .map(|_| annotation.deduction)
            .sum();

        // 扣分为负数，max_deduction 是下限
        total += match annotation.max_deduction {
            Some(floor) if raw < floor => floor,
            _ => raw,
        };
    }

    for criterion_result in criterion_results.iter().filter(|cr| cr.selected) {
        if let Some(criterion) = rubric
            .criteria
            .iter()
            .find(|c| c.id == criterion_result.criterion_id)
        {
            total += criterion.points;
        }
    }

    total += points_adjustment;

    total.max(0.0)
}

/// 计算满分
///
/// 设置了 `max_points` 时直接返回；否则为所有非负评分项分值之和。
pub fn compute_total_points_possible(rubric: &HandgradingRubric) -> f64 {
    if let Some(max_points) = rubric.max_points {
        return max_points;
    }

    rubric
        .criteria
        .iter()
        .map(|c| c.points)
        .filter(|points| *points >= 0.0)
        .sum()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::handgrading::entities::{Annotation, Criterion, Location};

    pub(crate) fn rubric(
        points_style: PointsStyle,
        max_points: Option<f64>,
        criteria: Vec<Criterion>,
        annotations: Vec<Annotation>,
    ) -> HandgradingRubric {
        HandgradingRubric {
            id: 1,
            project_id: 1,
            points_style,
            max_points,
            show_grades_and_rubric_to_students: true,
            show_only_applied_rubric_to_students: false,
            criteria,
            annotations,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    pub(crate) fn criterion(id: i64, points: f64) -> Criterion {
        Criterion {
            id,
            rubric_id: 1,
            short_description: format!("criterion {id}"),
            long_description: String::new(),
            points,
        }
    }

    pub(crate) fn annotation(id: i64, deduction: f64, max_deduction: Option<f64>) -> Annotation {
        Annotation {
            id,
            rubric_id: 1,
            short_description: format!("annotation {id}"),
            long_description: String::new(),
            deduction,
            max_deduction,
        }
    }

    pub(crate) fn criterion_result(id: i64, criterion_id: i64, selected: bool) -> CriterionResult {
        CriterionResult {
            id,
            result_id: 1,
            criterion_id,
            selected,
        }
    }

    pub(crate) fn applied_annotation(id: i64, annotation_id: i64) -> AppliedAnnotation {
        AppliedAnnotation {
            id,
            result_id: 1,
            annotation_id,
            location: Location {
                filename: "main.cpp".to_string(),
                first_line: 0,
                last_line: 1,
            },
            comment: String::new(),
        }
    }

    #[test]
    fn test_negative_criteria_clamp_to_zero() {
        let rubric = rubric(
            PointsStyle::StartAtZeroAndAdd,
            None,
            vec![criterion(1, -4.0), criterion(2, -2.0)],
            vec![],
        );
        let results = vec![criterion_result(1, 1, true), criterion_result(2, 2, true)];

        assert_eq!(compute_total_points(&rubric, &results, &[], 0.0), 0.0);
        assert_eq!(compute_total_points_possible(&rubric), 0.0);
    }

    #[test]
    fn test_start_at_max_with_capped_annotation() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(42.0),
            vec![],
            vec![annotation(1, -3.0, Some(-9.0))],
        );
        let applied: Vec<_> = (1..=4).map(|id| applied_annotation(id, 1)).collect();

        assert_eq!(compute_total_points(&rubric, &[], &applied, 0.0), 33.0);
        assert_eq!(compute_total_points_possible(&rubric), 42.0);
    }

    #[test]
    fn test_annotation_below_cap_is_not_clamped() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(20.0),
            vec![],
            vec![annotation(1, -3.0, Some(-9.0))],
        );
        let applied = vec![applied_annotation(1, 1), applied_annotation(2, 1)];

        assert_eq!(compute_total_points(&rubric, &[], &applied, 0.0), 14.0);
    }

    #[test]
    fn test_annotation_contribution_never_below_cap() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(100.0),
            vec![],
            vec![annotation(1, -2.5, Some(-7.0))],
        );

        for times in 0..10 {
            let applied: Vec<_> = (0..times).map(|id| applied_annotation(id, 1)).collect();
            let total = compute_total_points(&rubric, &[], &applied, 0.0);
            assert!(100.0 - total <= 7.0, "applied {times} times gave {total}");
        }
    }

    #[test]
    fn test_unapplied_annotation_contributes_nothing() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(10.0),
            vec![],
            vec![annotation(1, -5.0, Some(-5.0)), annotation(2, -1.0, None)],
        );

        assert_eq!(compute_total_points(&rubric, &[], &[], 0.0), 10.0);
    }

    #[test]
    fn test_uncapped_annotation_accumulates() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(10.0),
            vec![],
            vec![annotation(1, -1.5, None)],
        );
        let applied: Vec<_> = (1..=3).map(|id| applied_annotation(id, 1)).collect();

        assert_eq!(compute_total_points(&rubric, &[], &applied, 0.0), 5.5);
    }

    #[test]
    fn test_zero_max_deduction_still_caps() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(10.0),
            vec![],
            vec![annotation(1, -2.0, Some(0.0))],
        );
        let applied = vec![applied_annotation(1, 1), applied_annotation(2, 1)];

        assert_eq!(compute_total_points(&rubric, &[], &applied, 0.0), 10.0);
    }

    #[test]
    fn test_only_selected_criteria_count() {
        let rubric = rubric(
            PointsStyle::StartAtZeroAndAdd,
            None,
            vec![criterion(1, 5.0), criterion(2, 3.0), criterion(3, -1.0)],
            vec![],
        );
        let results = vec![
            criterion_result(1, 1, true),
            criterion_result(2, 2, false),
            criterion_result(3, 3, true),
        ];

        assert_eq!(compute_total_points(&rubric, &results, &[], 0.0), 4.0);
        assert_eq!(compute_total_points_possible(&rubric), 8.0);
    }

    #[test]
    fn test_points_adjustment_applies_both_signs() {
        let rubric = rubric(
            PointsStyle::StartAtZeroAndAdd,
            None,
            vec![criterion(1, 5.0)],
            vec![],
        );
        let results = vec![criterion_result(1, 1, true)];

        assert_eq!(compute_total_points(&rubric, &results, &[], 2.5), 7.5);
        assert_eq!(compute_total_points(&rubric, &results, &[], -3.0), 2.0);
        assert_eq!(compute_total_points(&rubric, &results, &[], -30.0), 0.0);
    }

    #[test]
    fn test_empty_rubric() {
        let add = rubric(PointsStyle::StartAtZeroAndAdd, None, vec![], vec![]);
        assert_eq!(compute_total_points(&add, &[], &[], 0.0), 0.0);
        assert_eq!(compute_total_points_possible(&add), 0.0);

        let subtract = rubric(PointsStyle::StartAtMaxAndSubtract, Some(15.0), vec![], vec![]);
        assert_eq!(compute_total_points(&subtract, &[], &[], 0.0), 15.0);
        assert_eq!(compute_total_points_possible(&subtract), 15.0);
    }

    #[test]
    fn test_explicit_max_points_overrides_criteria_sum() {
        let rubric = rubric(
            PointsStyle::StartAtZeroAndAdd,
            Some(3.0),
            vec![criterion(1, 5.0), criterion(2, 4.0)],
            vec![],
        );

        assert_eq!(compute_total_points_possible(&rubric), 3.0);
    }

    #[test]
    fn test_total_is_never_negative() {
        let rubric = rubric(
            PointsStyle::StartAtMaxAndSubtract,
            Some(5.0),
            vec![criterion(1, -10.0)],
            vec![annotation(1, -4.0, None)],
        );
        let results = vec![criterion_result(1, 1, true)];
        let applied = vec![applied_annotation(1, 1), applied_annotation(2, 1)];

        for adjustment in [-100.0, -1.0, 0.0, 1.0] {
            assert!(compute_total_points(&rubric, &results, &applied, adjustment) >= 0.0);
        }
    }
}
