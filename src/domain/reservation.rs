// ==========================================
// 校服尺码分配系统 - 预留策略
// ==========================================
// 职责: 按类别计算每个尺码的预留量
// 策略:
// - Fixed: reserved = ceil(total × ratio),与需求无关
// - Proportional: reserved = ceil(surplus × ratio(size)),
//   surplus = max(0, Σtotal - Σdemand);需求超过总量时整类预留归零
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 浮点向上取整容差（避免 100 × 0.1 的二进制误差多出一件）
const CEIL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReservationPolicy {
    /// 不预留
    #[default]
    None,
    /// 固定比例
    Fixed { ratio: f64 },
    /// 按富余量分尺码比例
    Proportional {
        #[serde(default)]
        ratios: BTreeMap<String, f64>,
    },
}

/// 类别级预留计算上下文（整类合计）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationBase {
    pub total_stock: u32,
    pub total_demand: u32,
}

impl ReservationBase {
    /// 富余量;需求超过库存时为 0
    pub fn surplus(&self) -> u32 {
        self.total_stock.saturating_sub(self.total_demand)
    }

    pub fn is_over_demanded(&self) -> bool {
        self.total_demand > self.total_stock
    }
}

impl ReservationPolicy {
    /// 计算单个尺码的预留量（已限制在 [0, total]）
    pub fn reserved_for(&self, size: &str, total: u32, base: ReservationBase) -> u32 {
        let raw = match self {
            ReservationPolicy::None => 0,
            ReservationPolicy::Fixed { ratio } => ceil_units(f64::from(total) * ratio),
            ReservationPolicy::Proportional { ratios } => {
                if base.is_over_demanded() {
                    0
                } else {
                    let ratio = ratios.get(size).copied().unwrap_or(0.0);
                    ceil_units(f64::from(base.surplus()) * ratio)
                }
            }
        };
        raw.min(total)
    }

    pub fn mode_str(&self) -> &'static str {
        match self {
            ReservationPolicy::None => "none",
            ReservationPolicy::Fixed { .. } => "fixed",
            ReservationPolicy::Proportional { .. } => "proportional",
        }
    }
}

/// 向上取整为件数;负数、NaN 视为 0
fn ceil_units(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let ceiled = (value - CEIL_EPSILON).ceil();
    if ceiled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        ceiled.max(0.0) as u32
    }
}
