use sha2::{Digest, Sha256};

use crate::models::mutant_hints::{
    entities::{
        MutantNameObfuscation, MutationTestSuite, MutationTestSuiteHintConfig, UnlockedHint,
    },
    responses::UnlockedHintResponse,
};

const HASH_PREFIX_LEN: usize = 10;

/// 按配置混淆变异体名称
///
/// `hash` 方式对同一小组稳定，不同小组之间互不相同。
pub fn obfuscate_mutant_name(
    mutant_name: &str,
    group_id: i64,
    suite: &MutationTestSuite,
    config: &MutationTestSuiteHintConfig,
) -> String {
    let prefix = &config.obfuscated_mutant_name_prefix;

    match config.obfuscate_mutant_names {
        MutantNameObfuscation::None => mutant_name.to_string(),
        MutantNameObfuscation::Sequential => {
            let index = suite
                .buggy_impl_names
                .iter()
                .position(|name| name == mutant_name)
                .map(|i| i as i64 + 1)
                .unwrap_or(-1);
            format!("{prefix} {index}")
        }
        MutantNameObfuscation::Hash => {
            let digest = Sha256::digest(format!("{mutant_name}_{group_id}").as_bytes());
            let encoded = hex::encode(digest);
            format!("{prefix} {}", &encoded[..HASH_PREFIX_LEN])
        }
    }
}

/// 混淆后的名称，以及调用方要求时附带的真实名称
pub fn displayed_mutant_names(
    mutant_name: &str,
    group_id: i64,
    suite: &MutationTestSuite,
    config: &MutationTestSuiteHintConfig,
    include_true_mutant_name: bool,
) -> (String, Option<String>) {
    let displayed = obfuscate_mutant_name(mutant_name, group_id, suite, config);
    let true_name = (include_true_mutant_name
        && config.obfuscate_mutant_names != MutantNameObfuscation::None)
        .then(|| mutant_name.to_string());
    (displayed, true_name)
}

pub fn to_hint_response(
    hint: UnlockedHint,
    group_id: i64,
    suite: &MutationTestSuite,
    config: &MutationTestSuiteHintConfig,
    include_true_mutant_name: bool,
) -> UnlockedHintResponse {
    let (mutant_name, true_mutant_name) = displayed_mutant_names(
        &hint.mutant_name,
        group_id,
        suite,
        config,
        include_true_mutant_name,
    );

    UnlockedHintResponse {
        id: hint.id,
        created_at: hint.created_at,
        mutation_test_suite_result_id: hint.mutation_test_suite_result_id,
        hint_config_id: hint.hint_config_id,
        mutant_name,
        true_mutant_name,
        hint_number: hint.hint_number,
        hint_text: hint.hint_text,
        hint_rating: hint.hint_rating,
        user_comment: hint.user_comment,
    }
}
