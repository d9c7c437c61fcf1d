// ==========================================
// 校服尺码分配系统 - 库存台账 (Inventory Ledger)
// ==========================================
// 职责: 预留重算、原子扣减、按类别重置
// 红线: try_decrement 是唯一的库存消耗入口,其他代码不得改写 allocatable/allocated
// 口径:
// - 台账只按尺码序列遍历;序列外的库存尺码保留原样但不参与计算
// - 序列内但快照缺失的尺码视为库存 0
// ==========================================

use crate::domain::inventory::{DemandByType, InventoryCell, InventorySnapshot, ManualOverrides};
use crate::domain::reservation::{ReservationBase, ReservationPolicy};
use crate::domain::size_ladder::SizeLadder;
use crate::domain::types::GarmentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 单类别预留重算摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub garment_type: GarmentType,
    pub policy_mode: String,
    pub total_stock: u32,
    pub total_demand: u32,
    pub total_reserved: u32,
    pub total_allocatable: u32,
    pub overridden_sizes: Vec<String>,
}

// ==========================================
// InventoryLedger - 库存台账
// ==========================================
// 所有权: 运行期间由 AllocationContext 独占
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    ladder: SizeLadder,
    cells: InventorySnapshot,
}

impl InventoryLedger {
    /// 从外部快照创建台账
    ///
    /// 序列外的尺码记录告警后原样保留
    pub fn new(ladder: SizeLadder, snapshot: InventorySnapshot) -> Self {
        for (garment, sizes) in &snapshot {
            for size in sizes.keys() {
                if !ladder.contains(size) {
                    warn!(
                        garment_type = %garment,
                        size_label = %size,
                        "库存尺码不在尺码序列上，忽略"
                    );
                }
            }
        }
        Self {
            ladder,
            cells: snapshot,
        }
    }

    pub fn ladder(&self) -> &SizeLadder {
        &self.ladder
    }

    /// 该类别是否存在库存台账
    pub fn has_type(&self, garment: GarmentType) -> bool {
        self.cells.get(&garment).is_some_and(|sizes| !sizes.is_empty())
    }

    pub fn cell(&self, garment: GarmentType, size: &str) -> Option<&InventoryCell> {
        self.cells.get(&garment).and_then(|sizes| sizes.get(size))
    }

    /// 当前可分配量（无记录为 0）
    pub fn allocatable(&self, garment: GarmentType, size: &str) -> u32 {
        self.cell(garment, size).map_or(0, |c| c.allocatable)
    }

    pub fn has_stock(&self, garment: GarmentType, size: &str, count: u32) -> bool {
        self.allocatable(garment, size) >= count
    }

    /// 类别总库存（仅序列内尺码）
    pub fn total_stock(&self, garment: GarmentType) -> u32 {
        self.ladder
            .labels()
            .filter_map(|size| self.cell(garment, size))
            .map(|c| c.total)
            .sum()
    }

    // ==========================================
    // 预留重算
    // ==========================================

    /// 按策略/人工覆写重算所有类别的 reserved/allocatable,并清零 allocated
    ///
    /// # 参数
    /// - `demand`: 类别 → 需求件数合计
    /// - `overrides`: 人工覆写（优先于策略）
    /// - `policies`: 类别 → 预留策略（缺失视为不预留）
    ///
    /// # 返回
    /// 每类别的重算摘要
    pub fn recompute_reservations(
        &mut self,
        demand: &DemandByType,
        overrides: &ManualOverrides,
        policies: &BTreeMap<GarmentType, ReservationPolicy>,
    ) -> Vec<ReservationSummary> {
        let mut summaries = Vec::new();
        let garments: Vec<GarmentType> = self.cells.keys().copied().collect();

        for garment in garments {
            let policy = policies.get(&garment).cloned().unwrap_or_default();
            let base = ReservationBase {
                total_stock: self.total_stock(garment),
                total_demand: demand.get(&garment).copied().unwrap_or(0),
            };
            let type_overrides = overrides.get(&garment);
            let mut summary = ReservationSummary {
                garment_type: garment,
                policy_mode: policy.mode_str().to_string(),
                total_stock: base.total_stock,
                total_demand: base.total_demand,
                total_reserved: 0,
                total_allocatable: 0,
                overridden_sizes: Vec::new(),
            };

            let sizes: Vec<String> = self.ladder.labels().map(str::to_string).collect();
            let Some(cells) = self.cells.get_mut(&garment) else {
                continue;
            };
            for size in sizes {
                let Some(cell) = cells.get_mut(&size) else {
                    continue;
                };

                match type_overrides.and_then(|o| o.get(&size)) {
                    Some(&override_value) => {
                        cell.allocatable = override_value.min(cell.total);
                        cell.reserved = cell.total - cell.allocatable;
                        summary.overridden_sizes.push(size.clone());
                    }
                    None => {
                        cell.reserved = policy.reserved_for(&size, cell.total, base);
                        cell.allocatable = cell.total - cell.reserved;
                    }
                }
                cell.allocated = 0;

                summary.total_reserved += cell.reserved;
                summary.total_allocatable += cell.allocatable;
            }

            debug!(
                garment_type = %garment,
                policy = %summary.policy_mode,
                total_stock = summary.total_stock,
                total_demand = summary.total_demand,
                total_reserved = summary.total_reserved,
                overridden = summary.overridden_sizes.len(),
                "预留重算完成"
            );
            summaries.push(summary);
        }

        summaries
    }

    // ==========================================
    // 扣减与重置
    // ==========================================

    /// 原子扣减: allocatable ≥ count 时把 count 件从 allocatable 移到 allocated
    ///
    /// # 返回
    /// - `true`: 扣减成功
    /// - `false`: 库存不足或无记录,未做任何修改
    pub fn try_decrement(&mut self, garment: GarmentType, size: &str, count: u32) -> bool {
        if !self.ladder.contains(size) {
            return false;
        }
        let Some(cell) = self.cells.get_mut(&garment).and_then(|s| s.get_mut(size)) else {
            return false;
        };
        if cell.allocatable < count {
            return false;
        }
        cell.allocatable -= count;
        cell.allocated += count;
        true
    }

    /// 重置单类别: allocatable = total - reserved, allocated = 0
    pub fn reset(&mut self, garment: GarmentType) {
        let sizes: Vec<String> = self.ladder.labels().map(str::to_string).collect();
        if let Some(cells) = self.cells.get_mut(&garment) {
            for size in sizes {
                if let Some(cell) = cells.get_mut(&size) {
                    cell.reserved = cell.reserved.min(cell.total);
                    cell.allocatable = cell.initial_allocatable();
                    cell.allocated = 0;
                }
            }
        }
    }

    /// 重置全部类别
    pub fn reset_all(&mut self) {
        for garment in GarmentType::ALL {
            self.reset(garment);
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 有库存的尺码（按序列顺序）
    pub fn available_sizes(&self, garment: GarmentType) -> Vec<String> {
        self.ladder
            .labels()
            .filter(|size| self.allocatable(garment, size) > 0)
            .map(str::to_string)
            .collect()
    }

    /// 当前可分配量最大的尺码;并列取序列靠前者;全部为 0 时返回 None
    pub fn best_available(&self, garment: GarmentType) -> Option<String> {
        let mut best: Option<(&str, u32)> = None;
        for size in self.ladder.labels() {
            let stock = self.allocatable(garment, size);
            if stock == 0 {
                continue;
            }
            match best {
                Some((_, best_stock)) if best_stock >= stock => {}
                _ => best = Some((size, stock)),
            }
        }
        best.map(|(size, _)| size.to_string())
    }

    /// 所有序列内单元均满足守恒
    pub fn is_conserved(&self) -> bool {
        self.cells.values().all(|sizes| {
            sizes
                .iter()
                .filter(|(size, _)| self.ladder.contains(size))
                .all(|(_, cell)| cell.is_conserved())
        })
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        self.cells.clone()
    }

    pub fn into_snapshot(self) -> InventorySnapshot {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::snapshot_from_totals;

    fn ladder() -> SizeLadder {
        SizeLadder::from_labels(&["S/36", "M/38", "L/40", "XL/42"]).unwrap()
    }

    fn ledger(entries: &[(GarmentType, &str, u32)]) -> InventoryLedger {
        InventoryLedger::new(ladder(), snapshot_from_totals(entries))
    }

    fn fixed(garment: GarmentType, ratio: f64) -> BTreeMap<GarmentType, ReservationPolicy> {
        let mut policies = BTreeMap::new();
        policies.insert(garment, ReservationPolicy::Fixed { ratio });
        policies
    }

    #[test]
    fn test_fixed_ratio_reservation() {
        let mut l = ledger(&[(GarmentType::ShortShirt, "M/38", 100)]);
        l.recompute_reservations(
            &DemandByType::new(),
            &ManualOverrides::new(),
            &fixed(GarmentType::ShortShirt, 0.1),
        );
        let cell = l.cell(GarmentType::ShortShirt, "M/38").unwrap();
        assert_eq!(cell.reserved, 10);
        assert_eq!(cell.allocatable, 90);
    }

    #[test]
    fn test_manual_override_takes_precedence() {
        let mut l = ledger(&[
            (GarmentType::ShortShirt, "M/38", 100),
            (GarmentType::ShortShirt, "L/40", 100),
        ]);
        let mut overrides = ManualOverrides::new();
        overrides
            .entry(GarmentType::ShortShirt)
            .or_default()
            .insert("M/38".to_string(), 40);

        let summaries = l.recompute_reservations(
            &DemandByType::new(),
            &overrides,
            &fixed(GarmentType::ShortShirt, 0.1),
        );

        let m = l.cell(GarmentType::ShortShirt, "M/38").unwrap();
        assert_eq!(m.allocatable, 40);
        assert_eq!(m.reserved, 60);
        let big = l.cell(GarmentType::ShortShirt, "L/40").unwrap();
        assert_eq!(big.reserved, 10);
        assert_eq!(summaries[0].overridden_sizes, vec!["M/38".to_string()]);
    }

    #[test]
    fn test_override_clamped_to_total() {
        let mut l = ledger(&[(GarmentType::LongPants, "S/36", 5)]);
        let mut overrides = ManualOverrides::new();
        overrides
            .entry(GarmentType::LongPants)
            .or_default()
            .insert("S/36".to_string(), 50);
        l.recompute_reservations(&DemandByType::new(), &overrides, &BTreeMap::new());
        let cell = l.cell(GarmentType::LongPants, "S/36").unwrap();
        assert_eq!(cell.allocatable, 5);
        assert_eq!(cell.reserved, 0);
    }

    #[test]
    fn test_try_decrement_is_atomic() {
        let mut l = ledger(&[(GarmentType::ShortPants, "M/38", 3)]);
        assert!(l.try_decrement(GarmentType::ShortPants, "M/38", 2));
        assert!(!l.try_decrement(GarmentType::ShortPants, "M/38", 2));

        let cell = l.cell(GarmentType::ShortPants, "M/38").unwrap();
        assert_eq!(cell.allocatable, 1);
        assert_eq!(cell.allocated, 2);
        assert!(l.is_conserved());

        assert!(!l.try_decrement(GarmentType::ShortPants, "XL/42", 1));
        assert!(!l.try_decrement(GarmentType::LongPants, "M/38", 1));
    }

    #[test]
    fn test_reset_restores_allocatable() {
        let mut l = ledger(&[(GarmentType::LongShirt, "L/40", 20)]);
        l.recompute_reservations(
            &DemandByType::new(),
            &ManualOverrides::new(),
            &fixed(GarmentType::LongShirt, 0.25),
        );
        assert!(l.try_decrement(GarmentType::LongShirt, "L/40", 7));

        l.reset(GarmentType::LongShirt);
        let cell = l.cell(GarmentType::LongShirt, "L/40").unwrap();
        assert_eq!(cell.reserved, 5);
        assert_eq!(cell.allocatable, 15);
        assert_eq!(cell.allocated, 0);
    }

    #[test]
    fn test_reset_then_recompute_is_idempotent() {
        let mut l = ledger(&[
            (GarmentType::ShortShirt, "S/36", 30),
            (GarmentType::ShortShirt, "M/38", 50),
        ]);
        let mut demand = DemandByType::new();
        demand.insert(GarmentType::ShortShirt, 60);
        let policies = fixed(GarmentType::ShortShirt, 0.2);

        l.reset_all();
        l.recompute_reservations(&demand, &ManualOverrides::new(), &policies);
        let first = l.snapshot();

        assert!(l.try_decrement(GarmentType::ShortShirt, "M/38", 4));
        l.reset_all();
        l.recompute_reservations(&demand, &ManualOverrides::new(), &policies);
        assert_eq!(l.snapshot(), first);
    }

    #[test]
    fn test_available_and_best_available() {
        let mut l = ledger(&[
            (GarmentType::ShortShirt, "S/36", 0),
            (GarmentType::ShortShirt, "M/38", 4),
            (GarmentType::ShortShirt, "L/40", 6),
            (GarmentType::ShortShirt, "XL/42", 6),
        ]);
        assert_eq!(
            l.available_sizes(GarmentType::ShortShirt),
            vec!["M/38".to_string(), "L/40".to_string(), "XL/42".to_string()]
        );
        // 并列取序列靠前者
        assert_eq!(l.best_available(GarmentType::ShortShirt), Some("L/40".to_string()));

        assert!(l.try_decrement(GarmentType::ShortShirt, "L/40", 3));
        assert_eq!(l.best_available(GarmentType::ShortShirt), Some("XL/42".to_string()));
        assert_eq!(l.best_available(GarmentType::LongShirt), None);
    }

    #[test]
    fn test_unknown_sizes_are_ignored() {
        let l = ledger(&[
            (GarmentType::ShortShirt, "M/38", 4),
            (GarmentType::ShortShirt, "XXXL/60", 9),
        ]);
        assert_eq!(l.total_stock(GarmentType::ShortShirt), 4);
        assert_eq!(l.best_available(GarmentType::ShortShirt), Some("M/38".to_string()));
        assert!(l.snapshot()[&GarmentType::ShortShirt].contains_key("XXXL/60"));
    }
}
