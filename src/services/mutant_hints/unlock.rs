//! 提示解锁
//!
//! 整个流程在小组锁内完成：配额读取、下一条提示的确定以及写入
//! 都经由同一个 [`HintUnlockTransaction`]，并发请求因此串行化，
//! 后到的请求一定能看到先到请求写入的提示。

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::HintService;
use super::obfuscate::to_hint_response;
use super::window::{hint_limit_window, parse_timezone};
use crate::errors::{HWSystemError, Result};
use crate::models::mutant_hints::{
    entities::{MutationTestSuiteHintConfig, MutationTestSuiteResult},
    requests::NewUnlockedHint,
    responses::{HintUnlockOutcome, NoHintReason},
};
use crate::storage::HintUnlockTransaction;

pub async fn request_hint(
    service: &HintService,
    result_id: i64,
    actor: &str,
    include_true_mutant_name: bool,
) -> Result<HintUnlockOutcome> {
    request_hint_at(service, result_id, actor, include_true_mutant_name, Utc::now()).await
}

pub async fn request_hint_at(
    service: &HintService,
    result_id: i64,
    actor: &str,
    include_true_mutant_name: bool,
    now: DateTime<Utc>,
) -> Result<HintUnlockOutcome> {
    let result = service.load_result(result_id).await?;
    let suite = service.load_suite(result.mutation_test_suite_id).await?;

    let unlock = service
        .get_storage()
        .begin_hint_unlock(result.group_id)
        .await?;

    let config = unlock
        .get_hint_config_by_suite(suite.id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("套件 {} 没有提示配置", suite.name)))?;

    check_quotas(&*unlock, &result, &config, now).await?;

    let Some(mutant_name) = suite.first_undetected_mutant(&result.bugs_exposed) else {
        return Ok(HintUnlockOutcome::NoContent(NoHintReason::AllBugsDetected));
    };

    let next_hint_number = unlock
        .latest_unlocked_hint(mutant_name)
        .await?
        .map(|latest| latest.hint_number + 1)
        .unwrap_or(0);

    let hints = config.hints_for(mutant_name);
    let Some(hint_text) = usize::try_from(next_hint_number)
        .ok()
        .and_then(|index| hints.get(index))
    else {
        return Ok(HintUnlockOutcome::NoContent(NoHintReason::HintsExhausted));
    };

    let hint = unlock
        .insert_unlocked_hint(NewUnlockedHint {
            mutation_test_suite_result_id: result.id,
            hint_config_id: config.id,
            mutant_name: mutant_name.to_string(),
            hint_number: next_hint_number,
            hint_text: hint_text.clone(),
            unlocked_by: actor.to_string(),
            created_at: now,
        })
        .await?;

    let group_id = unlock.group().id;
    unlock.commit().await?;

    info!(
        "Hint {} for mutant {} unlocked by {} (group {}, result {})",
        hint.hint_number, hint.mutant_name, actor, group_id, result.id
    );

    Ok(HintUnlockOutcome::Unlocked(to_hint_response(
        hint,
        group_id,
        &suite,
        &config,
        include_true_mutant_name,
    )))
}

// 先查每次提交的额度，再查当日额度
async fn check_quotas(
    unlock: &dyn HintUnlockTransaction,
    result: &MutationTestSuiteResult,
    config: &MutationTestSuiteHintConfig,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(limit) = config.num_hints_per_submission {
        let count = unlock
            .count_hints_for_submission(result.mutation_test_suite_id, result.submission_id)
            .await?;
        if count >= i64::from(limit) {
            warn!(
                "Per-submission hint limit reached for submission {}: {}/{}",
                result.submission_id, count, limit
            );
            return Err(HWSystemError::validation(format!(
                "该提交已解锁 {count}/{limit} 条提示，已达到每次提交的提示上限"
            )));
        }
    }

    if let Some(limit) = config.num_hints_per_day {
        let timezone = parse_timezone(&config.hint_limit_reset_timezone)?;
        let (start, end) = hint_limit_window(config.hint_limit_reset_time, timezone, now);
        let count = unlock.count_hints_in_window(config.id, start, end).await?;
        if count >= i64::from(limit) {
            warn!(
                "Daily hint limit reached for group {}: {}/{}",
                unlock.group().id,
                count,
                limit
            );
            return Err(HWSystemError::validation(format!(
                "今日已解锁 {count}/{limit} 条提示，已达到每日提示上限"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::models::mutant_hints::requests::CreateHintConfigRequest;
    use crate::models::mutant_hints::responses::UnlockedHintResponse;
    use crate::models::groups::requests::{CreateGroupRequest, CreateSubmissionRequest};
    use crate::services::mutant_hints::test_support::{fixture, fixture_on};
    use crate::storage::file_storage;

    fn unlocked(outcome: HintUnlockOutcome) -> UnlockedHintResponse {
        match outcome {
            HintUnlockOutcome::Unlocked(hint) => hint,
            other => panic!("expected an unlocked hint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_mutant_hints_then_exhausted() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1", "mut2", "mut3_no_hints"]).await;
        fx.config(
            &suite,
            &[
                ("mut1", &["hint1"]),
                ("mut2", &["mut2 a", "mut2 b", "mut2 c"]),
                ("mut3_no_hints", &[]),
            ],
            CreateHintConfigRequest::default(),
        )
        .await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        let hint = unlocked(fx.service.request_hint(result.id, "alice", false).await.unwrap());
        assert_eq!(hint.mutant_name, "mut1");
        assert_eq!(hint.hint_number, 0);
        assert_eq!(hint.hint_text, "hint1");

        let outcome = fx.service.request_hint(result.id, "alice", false).await.unwrap();
        assert_eq!(outcome, HintUnlockOutcome::NoContent(NoHintReason::HintsExhausted));
    }

    #[tokio::test]
    async fn test_hints_follow_first_undetected_mutant() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1", "mut2"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a"]), ("mut2", &["b0", "b1"])],
            CreateHintConfigRequest::default(),
        )
        .await;

        let result = fx.result(&suite, &fx.submission, &["mut1"]).await;
        let hint = unlocked(fx.service.request_hint(result.id, "bob", false).await.unwrap());
        assert_eq!(hint.mutant_name, "mut2");
        assert_eq!(hint.hint_text, "b0");

        let hint = unlocked(fx.service.request_hint(result.id, "bob", false).await.unwrap());
        assert_eq!(hint.hint_number, 1);
        assert_eq!(hint.hint_text, "b1");

        let stored = fx.storage.get_unlocked_hint_by_id(hint.id).await.unwrap().unwrap();
        assert_eq!(stored.unlocked_by, "bob");
    }

    #[tokio::test]
    async fn test_all_bugs_detected_is_no_content() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(&suite, &[("mut1", &["a"])], CreateHintConfigRequest::default())
            .await;
        let result = fx.result(&suite, &fx.submission, &["mut1"]).await;

        let outcome = fx.service.request_hint(result.id, "alice", false).await.unwrap();
        assert_eq!(outcome, HintUnlockOutcome::NoContent(NoHintReason::AllBugsDetected));
    }

    #[tokio::test]
    async fn test_missing_config_is_not_found() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        let err = fx
            .service
            .request_hint(result.id, "alice", false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");

        let err = fx.service.request_hint(9999, "alice", false).await.unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn test_per_submission_limit() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a", "b", "c"])],
            CreateHintConfigRequest {
                num_hints_per_submission: Some(1),
                ..Default::default()
            },
        )
        .await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        unlocked(fx.service.request_hint(result.id, "alice", false).await.unwrap());
        let err = fx
            .service
            .request_hint(result.id, "alice", false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(err.message().contains("1/1"));

        // 新的提交有新的额度，提示进度延续
        let resubmission = fx.submit().await;
        let result = fx.result(&suite, &resubmission, &[]).await;
        let hint = unlocked(fx.service.request_hint(result.id, "alice", false).await.unwrap());
        assert_eq!(hint.hint_number, 1);
    }

    #[tokio::test]
    async fn test_daily_limit_resets_with_window() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a", "b", "c", "d"])],
            CreateHintConfigRequest {
                num_hints_per_day: Some(2),
                hint_limit_reset_time: Some("11:50".to_string()),
                hint_limit_reset_timezone: Some("America/Chicago".to_string()),
                ..Default::default()
            },
        )
        .await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        // 11:00 CDT
        let morning = DateTime::parse_from_rfc3339("2024-03-20T16:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        for _ in 0..2 {
            unlocked(
                fx.service
                    .request_hint_at(result.id, "alice", false, morning)
                    .await
                    .unwrap(),
            );
        }

        let err = fx
            .service
            .request_hint_at(result.id, "alice", false, morning + TimeDelta::minutes(49))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
        assert!(err.message().contains("2/2"));
        assert!(err.message().contains("每日"));

        // 11:51 CDT 已是新窗口
        let hint = unlocked(
            fx.service
                .request_hint_at(result.id, "alice", false, morning + TimeDelta::minutes(51))
                .await
                .unwrap(),
        );
        assert_eq!(hint.hint_number, 2);
    }

    #[tokio::test]
    async fn test_quota_checked_before_no_content() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a"])],
            CreateHintConfigRequest {
                num_hints_per_submission: Some(1),
                ..Default::default()
            },
        )
        .await;
        let result = fx.result(&suite, &fx.submission, &[]).await;

        unlocked(fx.service.request_hint(result.id, "alice", false).await.unwrap());
        let err = fx
            .service
            .request_hint(result.id, "alice", false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_respect_submission_limit() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a", "b", "c", "d", "e"])],
            CreateHintConfigRequest {
                num_hints_per_submission: Some(1),
                ..Default::default()
            },
        )
        .await;
        let result_id = fx.result(&suite, &fx.submission, &[]).await.id;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = fx.service.clone();
                let actor = format!("member-{i}");
                tokio::spawn(async move { service.request_hint(result_id, &actor, false).await })
            })
            .collect();

        let mut issued = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(HintUnlockOutcome::Unlocked(_)) => issued += 1,
                Err(e) if e.code() == "E007" => rejected += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(issued, 1);
        assert_eq!(rejected, 7);
        assert_eq!(
            fx.service
                .count_hints_for_submission(suite.id, fx.submission.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_respect_daily_limit() {
        let fx = fixture().await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a", "b", "c", "d", "e"])],
            CreateHintConfigRequest {
                num_hints_per_day: Some(2),
                ..Default::default()
            },
        )
        .await;

        let mut handles = Vec::new();
        for _ in 0..6 {
            let submission = fx.submit().await;
            let result_id = fx.result(&suite, &submission, &[]).await.id;
            let service = fx.service.clone();
            handles.push(tokio::spawn(async move {
                service.request_hint(result_id, "alice", false).await
            }));
        }

        let mut issued = 0;
        for handle in handles {
            if let Ok(HintUnlockOutcome::Unlocked(_)) = handle.await.unwrap() {
                issued += 1;
            }
        }
        assert_eq!(issued, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_groups_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let fx = fixture_on(file_storage(&dir.path().join("grading.db")).await).await;
        let suite = fx.suite(&["mut1"]).await;
        fx.config(
            &suite,
            &[("mut1", &["a", "b", "c"])],
            CreateHintConfigRequest::default(),
        )
        .await;

        // 不同小组并发解锁，同一小组内也有两个请求
        let mut handles = Vec::new();
        let mut group_ids = Vec::new();
        for i in 0..6 {
            let group = fx
                .storage
                .create_group(CreateGroupRequest {
                    project_id: fx.group.project_id,
                    member_names: vec![format!("student-{i}")],
                })
                .await
                .unwrap();
            let submission = fx
                .storage
                .create_submission(CreateSubmissionRequest {
                    group_id: group.id,
                    submitted_filenames: vec!["tests.cpp".to_string()],
                    submitted_at: None,
                })
                .await
                .unwrap();
            let result_id = fx.result(&suite, &submission, &[]).await.id;
            group_ids.push(group.id);

            for _ in 0..2 {
                let service = fx.service.clone();
                let actor = format!("student-{i}");
                handles.push(tokio::spawn(async move {
                    service.request_hint(result_id, &actor, false).await
                }));
            }
        }

        for handle in handles {
            match handle.await.unwrap() {
                Ok(HintUnlockOutcome::Unlocked(_)) => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        for group_id in group_ids {
            let mut numbers: Vec<i32> = fx
                .service
                .list_unlocked_hints_for_group(group_id, false)
                .await
                .unwrap()
                .iter()
                .map(|h| h.hint_number)
                .collect();
            numbers.sort();
            assert_eq!(numbers, vec![0, 1]);
        }
    }
}
