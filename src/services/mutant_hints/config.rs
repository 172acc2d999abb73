use chrono::NaiveTime;
use tracing::info;

use super::HintService;
use super::window::parse_timezone;
use crate::entity::hint_configs::RESET_TIME_FORMAT;
use crate::errors::{HWSystemError, Result};
use crate::models::mutant_hints::{
    entities::MutationTestSuiteHintConfig,
    requests::{CreateHintConfigRequest, HintConfigValues, UpdateHintConfigRequest},
};

pub async fn create_hint_config(
    service: &HintService,
    suite_id: i64,
    req: CreateHintConfigRequest,
) -> Result<MutationTestSuiteHintConfig> {
    service.load_suite(suite_id).await?;

    let storage = service.get_storage();
    if storage.get_hint_config_by_suite(suite_id).await?.is_some() {
        return Err(HWSystemError::validation(format!(
            "套件 {suite_id} 已存在提示配置"
        )));
    }

    let defaults = service.get_defaults();
    let hint_limit_reset_time = match req.hint_limit_reset_time {
        Some(raw) => parse_reset_time(&raw)?,
        None => NaiveTime::MIN,
    };

    let values = HintConfigValues {
        hints_by_mutant_name: req.hints_by_mutant_name,
        num_hints_per_day: req.num_hints_per_day,
        num_hints_per_submission: req.num_hints_per_submission,
        hint_limit_reset_time,
        hint_limit_reset_timezone: req
            .hint_limit_reset_timezone
            .unwrap_or_else(|| defaults.default_reset_timezone.clone()),
        obfuscate_mutant_names: req.obfuscate_mutant_names.unwrap_or_default(),
        obfuscated_mutant_name_prefix: req
            .obfuscated_mutant_name_prefix
            .unwrap_or_else(|| defaults.default_obfuscated_mutant_name_prefix.clone()),
    };
    validate_values(&values)?;

    let config = storage.create_hint_config(suite_id, values).await?;
    info!(
        "Hint config {} created for mutation test suite {}",
        config.id, suite_id
    );
    Ok(config)
}

pub async fn get_hint_config(
    service: &HintService,
    suite_id: i64,
) -> Result<MutationTestSuiteHintConfig> {
    service
        .get_storage()
        .get_hint_config_by_suite(suite_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("套件 {suite_id} 没有提示配置")))
}

pub async fn update_hint_config(
    service: &HintService,
    config_id: i64,
    update: UpdateHintConfigRequest,
) -> Result<MutationTestSuiteHintConfig> {
    let storage = service.get_storage();
    let existing = storage
        .get_hint_config_by_id(config_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("提示配置 {config_id} 不存在")))?;

    let hint_limit_reset_time = match update.hint_limit_reset_time {
        Some(raw) => parse_reset_time(&raw)?,
        None => existing.hint_limit_reset_time,
    };

    // 合并后整体校验
    let values = HintConfigValues {
        hints_by_mutant_name: update
            .hints_by_mutant_name
            .unwrap_or(existing.hints_by_mutant_name),
        num_hints_per_day: update
            .num_hints_per_day
            .unwrap_or(existing.num_hints_per_day),
        num_hints_per_submission: update
            .num_hints_per_submission
            .unwrap_or(existing.num_hints_per_submission),
        hint_limit_reset_time,
        hint_limit_reset_timezone: update
            .hint_limit_reset_timezone
            .unwrap_or(existing.hint_limit_reset_timezone),
        obfuscate_mutant_names: update
            .obfuscate_mutant_names
            .unwrap_or(existing.obfuscate_mutant_names),
        obfuscated_mutant_name_prefix: update
            .obfuscated_mutant_name_prefix
            .unwrap_or(existing.obfuscated_mutant_name_prefix),
    };
    validate_values(&values)?;

    storage
        .update_hint_config(config_id, values)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("提示配置 {config_id} 不存在")))
}

pub async fn delete_hint_config(service: &HintService, config_id: i64) -> Result<()> {
    if !service.get_storage().delete_hint_config(config_id).await? {
        return Err(HWSystemError::not_found(format!(
            "提示配置 {config_id} 不存在"
        )));
    }

    info!("Hint config {} deleted", config_id);
    Ok(())
}

/// 接受 "HH:MM:SS" 或 "HH:MM"
pub fn parse_reset_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, RESET_TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| HWSystemError::validation(format!("无效的重置时间: {raw}")))
}

fn validate_values(values: &HintConfigValues) -> Result<()> {
    validate_limit("num_hints_per_day", values.num_hints_per_day)?;
    validate_limit("num_hints_per_submission", values.num_hints_per_submission)?;
    parse_timezone(&values.hint_limit_reset_timezone)?;
    Ok(())
}

fn validate_limit(field: &str, limit: Option<i32>) -> Result<()> {
    match limit {
        Some(limit) if limit < 1 => Err(HWSystemError::validation(format!(
            "{field} 必须大于等于 1"
        ))),
        _ => Ok(()),
    }
}
