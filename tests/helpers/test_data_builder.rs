// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use uniform_allocation::domain::{
    GarmentType, Gender, InventoryCell, InventorySnapshot, ManualOverrides, StudentRecord,
};

// ==========================================
// StudentRecord 构建器
// ==========================================

pub struct StudentBuilder {
    record: StudentRecord,
}

impl StudentBuilder {
    pub fn male(id: &str) -> Self {
        Self {
            record: StudentRecord::new(id, Gender::Male),
        }
    }

    pub fn female(id: &str) -> Self {
        Self {
            record: StudentRecord::new(id, Gender::Female),
        }
    }

    /// 设置胸围、腰围、裤长
    pub fn measured(mut self, chest: f64, waist: f64, pants_length: f64) -> Self {
        self.record.chest = Some(chest);
        self.record.waist = Some(waist);
        self.record.pants_length = Some(pants_length);
        self
    }

    pub fn class(mut self, class_name: &str, roll_number: &str) -> Self {
        self.record.class_name = class_name.to_string();
        self.record.roll_number = roll_number.to_string();
        self
    }

    pub fn needs(mut self, garment: GarmentType, count: u32) -> Self {
        self.record.required.set(garment, count);
        self
    }

    /// 四类各需要 count 件
    pub fn needs_all(mut self, count: u32) -> Self {
        for garment in GarmentType::ALL {
            self.record.required.set(garment, count);
        }
        self
    }

    pub fn build(self) -> StudentRecord {
        self.record
    }
}

// ==========================================
// 库存快照构建器
// ==========================================

#[derive(Default)]
pub struct InventoryBuilder {
    snapshot: InventorySnapshot,
}

impl InventoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(mut self, garment: GarmentType, size: &str, total: u32) -> Self {
        self.snapshot
            .entry(garment)
            .or_default()
            .insert(size.to_string(), InventoryCell::new(total));
        self
    }

    pub fn build(self) -> InventorySnapshot {
        self.snapshot
    }
}

/// 单条人工覆写
pub fn single_override(garment: GarmentType, size: &str, allocatable: u32) -> ManualOverrides {
    let mut overrides = ManualOverrides::new();
    overrides
        .entry(garment)
        .or_default()
        .insert(size.to_string(), allocatable);
    overrides
}
