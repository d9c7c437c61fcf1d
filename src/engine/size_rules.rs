// ==========================================
// 校服尺码分配系统 - 尺码规则核心
// ==========================================
// 职责: 测量数据 → 目标尺码的纯函数（无库存、无副作用）
// 上衣: 有效胸围 + 偏移(按性别、奇偶查表) → 首选/备选尺码
// 裤子: 腰围 × 系数 → 可用尺码中满足的最小码,否则最大码
// ==========================================

use crate::config::{DowngradeRule, PantsRuleSet, Parity, ShirtRuleSet};
use crate::domain::size_ladder::SizeLadder;
use crate::domain::types::Gender;
use crate::engine::error::{AllocationError, AllocationResult};

/// 上衣目标尺码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShirtTargets {
    pub preferred: String,
    pub alternative: String,
}

// ==========================================
// SizeRuleEngine - 尺码规则核心
// ==========================================
pub struct SizeRuleEngine;

impl SizeRuleEngine {
    /// 计算上衣首选/备选尺码
    ///
    /// # 参数
    /// - `effective_chest`: max(胸围, 腰围)
    ///
    /// # 返回
    /// 落档后的首选与备选尺码;规则表缺少 (性别, 奇偶) 条目时返回错误
    pub fn shirt_targets(
        ladder: &SizeLadder,
        rules: &ShirtRuleSet,
        gender: Gender,
        effective_chest: f64,
    ) -> AllocationResult<ShirtTargets> {
        let parity = Parity::of(effective_chest);
        let row = rules
            .offsets_for(gender, parity)
            .ok_or(AllocationError::MissingRuleRow { gender, parity })?;

        Ok(ShirtTargets {
            preferred: ladder
                .bucketize(effective_chest + row.preferred_offset)
                .to_string(),
            alternative: ladder
                .bucketize(effective_chest + row.alternative_offset)
                .to_string(),
        })
    }

    /// 裤长放码判定: 裤长 - 尺码数值 ≥ gap
    pub fn needs_upsize(pants_length: f64, size_number: u32, gap: f64) -> bool {
        pants_length - f64::from(size_number) >= gap
    }

    /// 降码判定
    pub fn should_downgrade(
        rule: &DowngradeRule,
        gender: Gender,
        size_number: u32,
        pants_length: f64,
    ) -> bool {
        gender == rule.gender
            && size_number >= rule.min_size_number
            && pants_length <= rule.max_pants_length
    }

    /// 裤长不足判定: 裤长 - 尺码数值 > threshold
    pub fn is_length_deficient(pants_length: f64, size_number: u32, threshold: f64) -> bool {
        pants_length - f64::from(size_number) > threshold
    }

    /// 裤子目标数值;腰围非正或非有限数时返回 None
    pub fn pants_target_number(rules: &PantsRuleSet, waist: f64) -> Option<f64> {
        if !waist.is_finite() || waist <= 0.0 {
            return None;
        }
        let target = waist * rules.waist_factor;
        target.is_finite().then_some(target)
    }

    /// 在可用尺码中选取: 数值 ≥ 目标的最小码,否则最大码
    ///
    /// # 返回
    /// 可用尺码列表中的下标;列表为空时返回 None
    pub fn pick_pants_index(
        ladder: &SizeLadder,
        available: &[String],
        target: f64,
    ) -> AllocationResult<Option<usize>> {
        if available.is_empty() {
            return Ok(None);
        }
        for (idx, size) in available.iter().enumerate() {
            if f64::from(ladder.number_of(size)?) >= target {
                return Ok(Some(idx));
            }
        }
        Ok(Some(available.len() - 1))
    }
}
