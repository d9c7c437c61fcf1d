// ==========================================
// 校服尺码分配系统 - 分配运行上下文
// ==========================================
// 职责: 一次运行的全部可变状态（学生、台账、人工覆写）
// 所有权: 运行期间由引擎独占;运行结束后以快照形式交还调用方
// ==========================================

use crate::domain::inventory::{DemandByType, InventorySnapshot, ManualOverrides};
use crate::domain::size_ladder::SizeLadder;
use crate::domain::student::StudentRecord;
use crate::domain::types::GarmentType;
use crate::engine::ledger::InventoryLedger;
use serde::{Deserialize, Serialize};

/// 引擎输入（由外部导入步骤解析好的纯数据）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationInput {
    pub students: Vec<StudentRecord>,
    pub inventory: InventorySnapshot,
    #[serde(default)]
    pub manual_overrides: ManualOverrides,
}

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    ReservationsRecomputed,
    Category(GarmentType),
    DeficiencyChecked,
    Done,
}

// ==========================================
// AllocationContext - 运行上下文
// ==========================================
pub struct AllocationContext {
    pub students: Vec<StudentRecord>,
    pub ledger: InventoryLedger,
    pub manual_overrides: ManualOverrides,
    phase: RunPhase,
}

impl AllocationContext {
    pub fn new(input: AllocationInput, ladder: SizeLadder) -> Self {
        Self {
            students: input.students,
            ledger: InventoryLedger::new(ladder, input.inventory),
            manual_overrides: input.manual_overrides,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, phase: RunPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "运行阶段切换");
        self.phase = phase;
    }

    /// 每类别需求件数合计
    pub fn demand_by_type(&self) -> DemandByType {
        let mut demand = DemandByType::new();
        for garment in GarmentType::ALL {
            let total: u32 = self
                .students
                .iter()
                .map(|s| s.required_count(garment))
                .sum();
            demand.insert(garment, total);
        }
        demand
    }

    /// 清空所有学生的单类别分配结果
    pub fn clear_category(&mut self, garment: GarmentType) {
        for student in &mut self.students {
            student.clear_assignment(garment);
        }
    }

    /// 拆分为 (学生, 库存快照, 人工覆写)
    pub fn into_parts(self) -> (Vec<StudentRecord>, InventorySnapshot, ManualOverrides) {
        (
            self.students,
            self.ledger.into_snapshot(),
            self.manual_overrides,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Gender;

    #[test]
    fn test_demand_by_type() {
        let mut a = StudentRecord::new("A", Gender::Male);
        a.required.short_shirt = 2;
        a.required.long_pants = 1;
        let mut b = StudentRecord::new("B", Gender::Female);
        b.required.short_shirt = 1;

        let ctx = AllocationContext::new(
            AllocationInput {
                students: vec![a, b],
                ..AllocationInput::default()
            },
            SizeLadder::default(),
        );

        let demand = ctx.demand_by_type();
        assert_eq!(demand[&GarmentType::ShortShirt], 3);
        assert_eq!(demand[&GarmentType::LongPants], 1);
        assert_eq!(demand[&GarmentType::ShortPants], 0);
        assert_eq!(ctx.phase(), RunPhase::Idle);
    }

    #[test]
    fn test_input_json_defaults_overrides() {
        let json = r#"{
            "students": [{"id": "S1", "gender": "female", "chest": 80, "waist": 66, "pants_length": 38}],
            "inventory": {"short_shirt": {"M/38": {"total": 5}}}
        }"#;
        let input: AllocationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.students.len(), 1);
        assert!(input.manual_overrides.is_empty());
        assert_eq!(input.inventory[&GarmentType::ShortShirt]["M/38"].total, 5);
    }
}
