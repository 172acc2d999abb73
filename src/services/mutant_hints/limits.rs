use chrono::{DateTime, Utc};

use super::HintService;
use super::window::{hint_limit_window, parse_timezone};
use crate::errors::Result;
use crate::models::mutant_hints::{
    entities::{MutationTestSuiteHintConfig, UnlockedHint},
    responses::{DailyHintLimitResponse, HintAllowance, HintCounts, HintLimitsResponse},
};

pub async fn count_hints_for_submission(
    service: &HintService,
    suite_id: i64,
    submission_id: i64,
) -> Result<i64> {
    service
        .get_storage()
        .count_hints_for_submission(suite_id, submission_id)
        .await
}

pub async fn count_hints_today(
    service: &HintService,
    group_id: i64,
    config: &MutationTestSuiteHintConfig,
) -> Result<i64> {
    count_hints_today_at(service, group_id, config, Utc::now()).await
}

pub async fn count_hints_today_at(
    service: &HintService,
    group_id: i64,
    config: &MutationTestSuiteHintConfig,
    now: DateTime<Utc>,
) -> Result<i64> {
    let timezone = parse_timezone(&config.hint_limit_reset_timezone)?;
    let (start, end) = hint_limit_window(config.hint_limit_reset_time, timezone, now);

    service
        .get_storage()
        .count_hints_in_window(group_id, config.id, start, end)
        .await
}

pub async fn count_locked_hints_remaining(
    service: &HintService,
    group_id: i64,
    config: &MutationTestSuiteHintConfig,
    mutant_name: &str,
) -> Result<i64> {
    let latest = service
        .get_storage()
        .latest_unlocked_hint(group_id, mutant_name)
        .await?;

    Ok(locked_hints_remaining(
        config.hints_for(mutant_name).len(),
        latest.as_ref(),
    ))
}

/// 配置的提示总数减去已解锁到的序号，不小于 0
pub fn locked_hints_remaining(total: usize, latest: Option<&UnlockedHint>) -> i64 {
    let total = total as i64;
    match latest {
        Some(hint) => (total - (i64::from(hint.hint_number) + 1)).max(0),
        None => total,
    }
}

pub async fn hint_limits(service: &HintService, result_id: i64) -> Result<HintLimitsResponse> {
    let result = service.load_result(result_id).await?;
    let suite = service.load_suite(result.mutation_test_suite_id).await?;
    let config = service.load_hint_config(&suite).await?;

    let submission = count_hints_for_submission(service, suite.id, result.submission_id).await?;
    let today = count_hints_today(service, result.group_id, &config).await?;

    Ok(HintLimitsResponse {
        num_hints_unlocked: HintCounts { submission, today },
        num_hints_allowed: HintAllowance {
            submission: config.num_hints_per_submission,
            today: config.num_hints_per_day,
        },
    })
}

pub async fn daily_hint_limit(
    service: &HintService,
    group_id: i64,
    suite_id: i64,
) -> Result<DailyHintLimitResponse> {
    let suite = service.load_suite(suite_id).await?;
    let config = service.load_hint_config(&suite).await?;

    Ok(DailyHintLimitResponse {
        num_hints_unlocked_today: count_hints_today(service, group_id, &config).await?,
        num_hints_per_day: config.num_hints_per_day,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::models::mutant_hints::requests::CreateHintConfigRequest;
    use crate::services::mutant_hints::test_support::fixture;

    fn hint(hint_number: i32) -> UnlockedHint {
        UnlockedHint {
            id: 1,
            mutation_test_suite_result_id: 1,
            hint_config_id: 1,
            mutant_name: "mut1".to_string(),
            hint_number,
            hint_text: String::new(),
            unlocked_by: String::new(),
            hint_rating: None,
            rated_by: String::new(),
            user_comment: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_locked_hints_remaining() {
        assert_eq!(locked_hints_remaining(3, None), 3);
        assert_eq!(locked_hints_remaining(3, Some(&hint(0))), 2);
        assert_eq!(locked_hints_remaining(3, Some(&hint(2))), 0);
        // 提示列表被缩短后不会出现负数
        assert_eq!(locked_hints_remaining(1, Some(&hint(4))), 0);
        assert_eq!(locked_hints_remaining(0, None), 0);
    }

    #[tokio::test]
    async fn test_hint_limits_report_usage() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a", "b", "c"])],
            CreateHintConfigRequest {
                num_hints_per_day: Some(5),
                num_hints_per_submission: Some(4),
                ..Default::default()
            },
        )
        .await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        for _ in 0..2 {
            fx.service.request_hint(result.id, "alice", false).await.unwrap();
        }

        let limits = fx.service.hint_limits(result.id).await.unwrap();
        assert_eq!(
            limits,
            HintLimitsResponse {
                num_hints_unlocked: HintCounts {
                    submission: 2,
                    today: 2,
                },
                num_hints_allowed: HintAllowance {
                    submission: Some(4),
                    today: Some(5),
                },
            }
        );

        let daily = fx
            .service
            .daily_hint_limit(fx.group.id, suite.id)
            .await
            .unwrap();
        assert_eq!(daily.num_hints_unlocked_today, 2);
        assert_eq!(daily.num_hints_per_day, Some(5));
    }

    #[tokio::test]
    async fn test_count_hints_today_uses_window() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        let config = fx
            .config(
                &suite,
                &[("mut1", &["a", "b"])],
                CreateHintConfigRequest::default(),
            )
            .await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        let yesterday = Utc::now() - TimeDelta::days(1);
        fx.service
            .request_hint_at(result.id, "alice", false, yesterday)
            .await
            .unwrap();

        let now = Utc::now();
        assert_eq!(
            count_hints_today_at(&fx.service, fx.group.id, &config, now)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            count_hints_today_at(&fx.service, fx.group.id, &config, yesterday)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            fx.service
                .count_hints_for_submission(suite.id, fx.submission.id)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            fx.service
                .count_locked_hints_remaining(fx.group.id, &config, "mut1")
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_limits_without_config_are_not_found() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        assert_eq!(
            fx.service.hint_limits(result.id).await.unwrap_err().code(),
            "E008"
        );
        assert_eq!(
            fx.service
                .daily_hint_limit(fx.group.id, suite.id)
                .await
                .unwrap_err()
                .code(),
            "E008"
        );
    }
}
