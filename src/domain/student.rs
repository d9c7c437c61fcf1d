// ==========================================
// 校服尺码分配系统 - 学生领域模型
// ==========================================
// 职责: 学生测量数据 + 每类别需求件数 + 每类别分配结果
// 生命周期: 每次分配运行开始时按类别清空,每类别每次运行仅写入一次
// ==========================================

use crate::domain::types::{AdjustmentMark, FailureReason, GarmentType, Gender};
use serde::{Deserialize, Serialize};

// ==========================================
// 类别需求件数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GarmentCounts {
    #[serde(default)]
    pub short_shirt: u32,
    #[serde(default)]
    pub short_pants: u32,
    #[serde(default)]
    pub long_shirt: u32,
    #[serde(default)]
    pub long_pants: u32,
}

impl GarmentCounts {
    /// 四类均为同一件数
    pub fn uniform(count: u32) -> Self {
        Self {
            short_shirt: count,
            short_pants: count,
            long_shirt: count,
            long_pants: count,
        }
    }

    pub fn get(&self, garment: GarmentType) -> u32 {
        match garment {
            GarmentType::ShortShirt => self.short_shirt,
            GarmentType::ShortPants => self.short_pants,
            GarmentType::LongShirt => self.long_shirt,
            GarmentType::LongPants => self.long_pants,
        }
    }

    pub fn set(&mut self, garment: GarmentType, count: u32) {
        match garment {
            GarmentType::ShortShirt => self.short_shirt = count,
            GarmentType::ShortPants => self.short_pants = count,
            GarmentType::LongShirt => self.long_shirt = count,
            GarmentType::LongPants => self.long_pants = count,
        }
    }
}

// ==========================================
// CategoryAssignment - 单类别分配结果
// ==========================================
// size 恒为干净的尺码标签;调整标记独立存放
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryAssignment {
    /// 最终分配尺码
    pub size: Option<String>,
    /// 规则直接计算出的目标尺码（补货报表口径）
    pub target_size: Option<String>,
    pub mark: AdjustmentMark,
    /// 第二阶段"最大库存"兜底分配
    pub special: bool,
    pub failure: Option<FailureReason>,
    /// 分配后裤长仍明显超出尺码（仅提示,不触发重分配）
    pub deficient: bool,
}

impl CategoryAssignment {
    pub fn is_assigned(&self) -> bool {
        self.size.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// 报表展示文本,如 "L/40↑"
    pub fn display_size(&self) -> String {
        match &self.size {
            Some(size) => format!("{}{}", size, self.mark.symbol()),
            None => String::new(),
        }
    }
}

// ==========================================
// 每类别分配结果集合
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudentAssignments {
    #[serde(default)]
    pub short_shirt: CategoryAssignment,
    #[serde(default)]
    pub short_pants: CategoryAssignment,
    #[serde(default)]
    pub long_shirt: CategoryAssignment,
    #[serde(default)]
    pub long_pants: CategoryAssignment,
}

impl StudentAssignments {
    pub fn get(&self, garment: GarmentType) -> &CategoryAssignment {
        match garment {
            GarmentType::ShortShirt => &self.short_shirt,
            GarmentType::ShortPants => &self.short_pants,
            GarmentType::LongShirt => &self.long_shirt,
            GarmentType::LongPants => &self.long_pants,
        }
    }

    pub fn get_mut(&mut self, garment: GarmentType) -> &mut CategoryAssignment {
        match garment {
            GarmentType::ShortShirt => &mut self.short_shirt,
            GarmentType::ShortPants => &mut self.short_pants,
            GarmentType::LongShirt => &mut self.long_shirt,
            GarmentType::LongPants => &mut self.long_pants,
        }
    }
}

// ==========================================
// StudentRecord - 学生记录
// ==========================================
// 由外部导入步骤创建;分配引擎只写 assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    // ===== 身份 =====
    pub id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub roll_number: String,
    #[serde(default)]
    pub name: String,
    pub gender: Gender,

    // ===== 测量数据 (任一缺失则不参与分配) =====
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub pants_length: Option<f64>,

    // ===== 需求 =====
    #[serde(default)]
    pub required: GarmentCounts,

    // ===== 分配结果 (引擎派生) =====
    #[serde(default)]
    pub assignments: StudentAssignments,
}

/// 有效测量数据（三项齐全且为有限数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub chest: f64,
    pub waist: f64,
    pub pants_length: f64,
}

impl Measurements {
    /// 有效胸围 = max(胸围, 腰围)
    pub fn effective_chest(&self) -> f64 {
        self.chest.max(self.waist)
    }
}

impl StudentRecord {
    pub fn new(id: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            class_name: String::new(),
            roll_number: String::new(),
            name: String::new(),
            gender,
            chest: None,
            waist: None,
            pants_length: None,
            required: GarmentCounts::default(),
            assignments: StudentAssignments::default(),
        }
    }

    /// 有效测量数据;任一缺失或非有限数返回 None
    pub fn measurements(&self) -> Option<Measurements> {
        let chest = self.chest.filter(|v| v.is_finite())?;
        let waist = self.waist.filter(|v| v.is_finite())?;
        let pants_length = self.pants_length.filter(|v| v.is_finite())?;
        Some(Measurements {
            chest,
            waist,
            pants_length,
        })
    }

    pub fn required_count(&self, garment: GarmentType) -> u32 {
        self.required.get(garment)
    }

    pub fn assignment(&self, garment: GarmentType) -> &CategoryAssignment {
        self.assignments.get(garment)
    }

    pub fn assignment_mut(&mut self, garment: GarmentType) -> &mut CategoryAssignment {
        self.assignments.get_mut(garment)
    }

    /// 清空单类别分配结果
    pub fn clear_assignment(&mut self, garment: GarmentType) {
        *self.assignments.get_mut(garment) = CategoryAssignment::default();
    }
}
