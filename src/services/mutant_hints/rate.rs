use tracing::debug;

use super::HintService;
use crate::errors::{HWSystemError, Result};
use crate::models::mutant_hints::{entities::UnlockedHint, requests::RateHintRequest};

/// 评价提示，只有解锁该提示的小组成员可以评价
pub async fn rate_hint(
    service: &HintService,
    hint_id: i64,
    actor: &str,
    actor_group_id: i64,
    req: RateHintRequest,
) -> Result<UnlockedHint> {
    let storage = service.get_storage();

    let hint = storage
        .get_unlocked_hint_by_id(hint_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("提示 {hint_id} 不存在")))?;
    let result = service
        .load_result(hint.mutation_test_suite_result_id)
        .await?;

    if result.group_id != actor_group_id {
        return Err(HWSystemError::authorization("只能评价本小组解锁的提示"));
    }

    let rated = storage
        .rate_unlocked_hint(hint_id, req.hint_rating, req.user_comment, actor)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("提示 {hint_id} 不存在")))?;

    debug!("Hint {} rated {} by {}", hint_id, req.hint_rating, actor);
    Ok(rated)
}
