// ==========================================
// 校服尺码分配系统 - 分配统计
// ==========================================
// 口径: 每次运行由最终学生记录全量重算,不做增量累加
// ==========================================

use crate::domain::types::{FailureReason, GarmentType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStatistics {
    pub garment_type: GarmentType,

    // ===== 人数口径 =====
    pub demanding: u32, // 需求 > 0
    pub skipped: u32,   // 需求 = 0
    pub allocated: u32, // 已分配尺码
    pub exact: u32,     // 规则尺码直接命中（无标记、非兜底）
    pub adjusted: u32,  // 升码/降码
    pub special: u32,   // 第二阶段兜底
    pub failed: u32,

    // ===== 调整标记计数 =====
    pub upsized: u32,
    pub downsized: u32,
    pub fallback: u32,

    // ===== 件数口径 =====
    pub units_allocated: u32,

    /// 裤长不足提示人数
    pub deficient: u32,

    #[serde(default)]
    pub failure_reasons: BTreeMap<FailureReason, u32>,
}

impl AllocationStatistics {
    pub fn empty(garment_type: GarmentType) -> Self {
        Self {
            garment_type,
            demanding: 0,
            skipped: 0,
            allocated: 0,
            exact: 0,
            adjusted: 0,
            special: 0,
            failed: 0,
            upsized: 0,
            downsized: 0,
            fallback: 0,
            units_allocated: 0,
            deficient: 0,
            failure_reasons: BTreeMap::new(),
        }
    }

    /// 分配成功率（无需求时为 1.0）
    pub fn success_rate(&self) -> f64 {
        if self.demanding == 0 {
            return 1.0;
        }
        f64::from(self.allocated) / f64::from(self.demanding)
    }
}
