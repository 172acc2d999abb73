use std::collections::HashMap;

use super::HintService;
use super::limits::count_locked_hints_remaining;
use super::obfuscate::{displayed_mutant_names, to_hint_response};
use crate::errors::{HWSystemError, Result};
use crate::models::mutant_hints::{
    entities::{MutationTestSuite, MutationTestSuiteHintConfig},
    responses::{NumHintsRemainingResponse, UnlockedHintResponse},
};

/// 当前第一个未检出变异体的已解锁提示
///
/// 按小组累计，同一小组在其他提交上解锁的提示也会列出。
pub async fn list_unlocked_hints_for_result(
    service: &HintService,
    result_id: i64,
    include_true_mutant_name: bool,
) -> Result<Vec<UnlockedHintResponse>> {
    let result = service.load_result(result_id).await?;
    let suite = service.load_suite(result.mutation_test_suite_id).await?;

    let Some(mutant_name) = suite.first_undetected_mutant(&result.bugs_exposed) else {
        return Ok(Vec::new());
    };

    let config = service.load_hint_config(&suite).await?;
    let hints = service
        .get_storage()
        .list_unlocked_hints_for_mutant(result.group_id, suite.id, mutant_name)
        .await?;

    Ok(hints
        .into_iter()
        .map(|hint| {
            to_hint_response(
                hint,
                result.group_id,
                &suite,
                &config,
                include_true_mutant_name,
            )
        })
        .collect())
}

/// 小组解锁过的全部提示，各自按所属套件的配置混淆
pub async fn list_unlocked_hints_for_group(
    service: &HintService,
    group_id: i64,
    include_true_mutant_name: bool,
) -> Result<Vec<UnlockedHintResponse>> {
    let storage = service.get_storage();
    let hints = storage.list_unlocked_hints_for_group(group_id).await?;

    let mut configs: HashMap<i64, (MutationTestSuiteHintConfig, MutationTestSuite)> =
        HashMap::new();
    let mut responses = Vec::with_capacity(hints.len());

    for hint in hints {
        if !configs.contains_key(&hint.hint_config_id) {
            let config = storage
                .get_hint_config_by_id(hint.hint_config_id)
                .await?
                .ok_or_else(|| {
                    HWSystemError::not_found(format!("提示配置 {} 不存在", hint.hint_config_id))
                })?;
            let suite = service.load_suite(config.mutation_test_suite_id).await?;
            configs.insert(hint.hint_config_id, (config, suite));
        }

        if let Some((config, suite)) = configs.get(&hint.hint_config_id) {
            responses.push(to_hint_response(
                hint,
                group_id,
                suite,
                config,
                include_true_mutant_name,
            ));
        }
    }

    Ok(responses)
}

/// 当前变异体剩余可解锁的提示数，全部检出时为 `None`
pub async fn num_hints_remaining(
    service: &HintService,
    result_id: i64,
    include_true_mutant_name: bool,
) -> Result<Option<NumHintsRemainingResponse>> {
    let result = service.load_result(result_id).await?;
    let suite = service.load_suite(result.mutation_test_suite_id).await?;

    // 全部检出时无需配置
    let Some(mutant_name) = suite.first_undetected_mutant(&result.bugs_exposed) else {
        return Ok(None);
    };
    let config = service.load_hint_config(&suite).await?;

    let num_hints_remaining =
        count_locked_hints_remaining(service, result.group_id, &config, mutant_name).await?;
    let (mutant_name, true_mutant_name) = displayed_mutant_names(
        mutant_name,
        result.group_id,
        &suite,
        &config,
        include_true_mutant_name,
    );

    Ok(Some(NumHintsRemainingResponse {
        num_hints_remaining,
        mutant_name,
        true_mutant_name,
    }))
}
