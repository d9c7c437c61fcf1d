// ==========================================
// 校服尺码分配系统 - 库存领域模型
// ==========================================
// 职责: 库存单元 (类别 × 尺码) 与外部快照结构
// 红线: 运行开始后 allocatable/reserved/allocated 只由台账写入
// ==========================================

use crate::domain::types::GarmentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// InventoryCell - 库存单元
// ==========================================
// 不变式: allocated + allocatable == total - reserved (单次运行内)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryCell {
    pub total: u32,       // 实物库存 (权威值)
    #[serde(default)]
    pub reserved: u32,    // 预留 (策略计算或人工覆写反推)
    #[serde(default)]
    pub allocatable: u32, // 可分配 (本次运行剩余)
    #[serde(default)]
    pub allocated: u32,   // 本次运行已分配
}

impl InventoryCell {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            reserved: 0,
            allocatable: total,
            allocated: 0,
        }
    }

    /// 运行开始时的可分配量
    pub fn initial_allocatable(&self) -> u32 {
        self.total.saturating_sub(self.reserved)
    }

    /// 守恒检查
    pub fn is_conserved(&self) -> bool {
        self.allocated + self.allocatable == self.initial_allocatable()
    }
}

/// 库存快照: 类别 → 尺码 → 库存单元
pub type InventorySnapshot = BTreeMap<GarmentType, BTreeMap<String, InventoryCell>>;

/// 人工覆写: 类别 → 尺码 → 可分配量
pub type ManualOverrides = BTreeMap<GarmentType, BTreeMap<String, u32>>;

/// 需求: 类别 → 需求件数合计
pub type DemandByType = BTreeMap<GarmentType, u32>;

/// 快照工具: 按 (类别, 尺码, 总量) 列表构造
pub fn snapshot_from_totals(entries: &[(GarmentType, &str, u32)]) -> InventorySnapshot {
    let mut snapshot = InventorySnapshot::new();
    for (garment, size, total) in entries {
        snapshot
            .entry(*garment)
            .or_default()
            .insert((*size).to_string(), InventoryCell::new(*total));
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_conservation() {
        let mut cell = InventoryCell::new(10);
        cell.reserved = 2;
        cell.allocatable = 5;
        cell.allocated = 3;
        assert_eq!(cell.initial_allocatable(), 8);
        assert!(cell.is_conserved());

        cell.allocated = 4;
        assert!(!cell.is_conserved());
    }

    #[test]
    fn test_cell_deserialize_with_optional_fields() {
        let cell: InventoryCell = serde_json::from_str(r#"{"total": 12}"#).unwrap();
        assert_eq!(cell.total, 12);
        assert_eq!(cell.reserved, 0);
        assert_eq!(cell.allocated, 0);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = snapshot_from_totals(&[(GarmentType::ShortShirt, "M/38", 5)]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["short_shirt"]["M/38"]["total"], 5);
    }
}
