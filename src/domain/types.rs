// ==========================================
// 校服尺码分配系统 - 领域类型定义
// ==========================================
// 职责: 服装类别、性别、调整标记、失败原因
// 红线: 分配尺码与调整标记分离存储,不在尺码字符串中拼接标记
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 服装类别 (Garment Type)
// ==========================================
// 顺序即分配顺序: 短袖上衣 → 短袖裤 → 长袖上衣 → 长袖裤
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentType {
    ShortShirt, // 短袖上衣
    ShortPants, // 短袖裤
    LongShirt,  // 长袖上衣
    LongPants,  // 长袖裤
}

impl GarmentType {
    /// 固定分配顺序
    pub const ALL: [GarmentType; 4] = [
        GarmentType::ShortShirt,
        GarmentType::ShortPants,
        GarmentType::LongShirt,
        GarmentType::LongPants,
    ];

    /// 是否为上衣类（按胸围规则分配）
    pub fn is_shirt(&self) -> bool {
        matches!(self, GarmentType::ShortShirt | GarmentType::LongShirt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentType::ShortShirt => "short_shirt",
            GarmentType::ShortPants => "short_pants",
            GarmentType::LongShirt => "long_shirt",
            GarmentType::LongPants => "long_pants",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            GarmentType::ShortShirt => "短袖上衣",
            GarmentType::ShortPants => "短袖裤",
            GarmentType::LongShirt => "长袖上衣",
            GarmentType::LongPants => "长袖裤",
        }
    }
}

impl fmt::Display for GarmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GarmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short_shirt" | "short-shirt" => Ok(GarmentType::ShortShirt),
            "short_pants" | "short-pants" => Ok(GarmentType::ShortPants),
            "long_shirt" | "long-shirt" => Ok(GarmentType::LongShirt),
            "long_pants" | "long-pants" => Ok(GarmentType::LongPants),
            other => Err(format!("未知服装类别: {}", other)),
        }
    }
}

// ==========================================
// 性别 (Gender)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,   // 男
    Female, // 女
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "MALE"),
            Gender::Female => write!(f, "FEMALE"),
        }
    }
}

// ==========================================
// 调整标记 (Adjustment Mark)
// ==========================================
// ↑ 放大一码 / ↓ 缩小一码 / * 需放大但库存不足
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMark {
    #[default]
    None,
    Upsize,
    Downsize,
    Fallback,
}

impl AdjustmentMark {
    /// 展示符号（仅用于报表,不参与存储）
    pub fn symbol(&self) -> &'static str {
        match self {
            AdjustmentMark::None => "",
            AdjustmentMark::Upsize => "↑",
            AdjustmentMark::Downsize => "↓",
            AdjustmentMark::Fallback => "*",
        }
    }

    /// 是否与规则直接计算的尺码不同
    pub fn is_adjusted(&self) -> bool {
        matches!(self, AdjustmentMark::Upsize | AdjustmentMark::Downsize)
    }
}

impl fmt::Display for AdjustmentMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ==========================================
// 失败原因 (Failure Reason)
// ==========================================
// 按学生、按类别记录;不以 Err 抛出
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    MissingInventory,     // 该类别无库存台账
    MissingMeasurements,  // 胸围/腰围/裤长缺失
    NoQualifyingSize,     // 无可落档尺码（仅裤类）
    InsufficientStock,    // 目标尺码库存不足（含调整后）
    DowngradeUnavailable, // 女生降码目标无库存
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::MissingInventory => "MISSING_INVENTORY",
            FailureReason::MissingMeasurements => "MISSING_MEASUREMENTS",
            FailureReason::NoQualifyingSize => "NO_QUALIFYING_SIZE",
            FailureReason::InsufficientStock => "INSUFFICIENT_STOCK",
            FailureReason::DowngradeUnavailable => "DOWNGRADE_UNAVAILABLE",
        }
    }

    /// 是否属于库存短缺类失败（补货报表口径）
    pub fn is_stock_shortage(&self) -> bool {
        matches!(
            self,
            FailureReason::InsufficientStock | FailureReason::DowngradeUnavailable
        )
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            FailureReason::MissingInventory => "无该类别库存",
            FailureReason::MissingMeasurements => "测量数据缺失",
            FailureReason::NoQualifyingSize => "无匹配尺码",
            FailureReason::InsufficientStock => "库存不足",
            FailureReason::DowngradeUnavailable => "降码尺码无库存",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
