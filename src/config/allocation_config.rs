// ==========================================
// 校服尺码分配系统 - 分配配置与规则表
// ==========================================
// 职责: 尺码序列、预留策略、上衣/裤子规则表、裤长提示阈值
// 红线: 规则以数据表达(查表),新增学校/策略只改数据不改代码
// ==========================================

use crate::domain::reservation::ReservationPolicy;
use crate::domain::size_ladder::SizeLadder;
use crate::domain::types::{GarmentType, Gender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 奇偶性
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// 整数值按 % 2 判定;非整数一律视为奇数
    pub fn of(value: f64) -> Self {
        if value.fract() == 0.0 && (value as i64) % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

// ==========================================
// 上衣规则
// ==========================================

/// 上衣偏移规则行: (性别, 有效胸围奇偶) → 首选/备选偏移
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShirtOffsetRule {
    pub gender: Gender,
    pub parity: Parity,
    pub preferred_offset: f64,
    pub alternative_offset: f64,
}

/// 降码规则: 性别匹配、尺码数值 ≥ min_size_number 且裤长 ≤ max_pants_length 时降一码
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DowngradeRule {
    pub gender: Gender,
    pub min_size_number: u32,
    pub max_pants_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShirtRuleSet {
    pub offsets: Vec<ShirtOffsetRule>,
    /// 裤长 - 尺码数值 ≥ 该值时尝试放大一码
    pub upsize_length_gap: f64,
    #[serde(default)]
    pub downgrade: Option<DowngradeRule>,
}

impl ShirtRuleSet {
    /// 查表: 未命中返回 None（视为配置缺失）
    pub fn offsets_for(&self, gender: Gender, parity: Parity) -> Option<&ShirtOffsetRule> {
        self.offsets
            .iter()
            .find(|r| r.gender == gender && r.parity == parity)
    }
}

impl Default for ShirtRuleSet {
    fn default() -> Self {
        let row = |gender, parity, preferred_offset, alternative_offset| ShirtOffsetRule {
            gender,
            parity,
            preferred_offset,
            alternative_offset,
        };
        Self {
            offsets: vec![
                row(Gender::Male, Parity::Even, 10.0, 12.0),
                row(Gender::Male, Parity::Odd, 11.0, 13.0),
                row(Gender::Female, Parity::Even, 8.0, 10.0),
                row(Gender::Female, Parity::Odd, 9.0, 11.0),
            ],
            upsize_length_gap: 3.0,
            downgrade: Some(DowngradeRule {
                gender: Gender::Female,
                min_size_number: 44,
                max_pants_length: 38.0,
            }),
        }
    }
}

// ==========================================
// 裤子规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PantsRuleSet {
    /// 目标尺码数值 = 腰围 × waist_factor
    pub waist_factor: f64,
    /// 裤长 - 尺码数值 ≥ 该值时尝试放大一码
    pub upsize_length_gap: f64,
}

impl Default for PantsRuleSet {
    fn default() -> Self {
        Self {
            waist_factor: 1.2,
            upsize_length_gap: 2.0,
        }
    }
}

// ==========================================
// AllocationConfig - 分配配置全集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    #[serde(default)]
    pub size_ladder: SizeLadder,
    #[serde(default)]
    pub reservation_policies: BTreeMap<GarmentType, ReservationPolicy>,
    #[serde(default)]
    pub shirt_rules: ShirtRuleSet,
    #[serde(default)]
    pub pants_rules: PantsRuleSet,
    /// 裤长 - 尺码数值 > 阈值时标记提示
    #[serde(default = "default_deficiency_thresholds")]
    pub deficiency_thresholds: BTreeMap<GarmentType, f64>,
    /// 每处理多少名学生让出一次执行权
    #[serde(default = "default_yield_every")]
    pub yield_every: usize,
}

impl AllocationConfig {
    pub fn reservation_policy(&self, garment: GarmentType) -> ReservationPolicy {
        self.reservation_policies
            .get(&garment)
            .cloned()
            .unwrap_or_default()
    }

    pub fn deficiency_threshold(&self, garment: GarmentType) -> f64 {
        self.deficiency_thresholds
            .get(&garment)
            .copied()
            .unwrap_or_else(|| default_deficiency_threshold(garment))
    }
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            size_ladder: SizeLadder::default(),
            reservation_policies: BTreeMap::new(),
            shirt_rules: ShirtRuleSet::default(),
            pants_rules: PantsRuleSet::default(),
            deficiency_thresholds: default_deficiency_thresholds(),
            yield_every: default_yield_every(),
        }
    }
}

/// 默认裤长提示阈值: 上衣与短袖裤 2,长袖裤 3
pub fn default_deficiency_threshold(garment: GarmentType) -> f64 {
    match garment {
        GarmentType::LongPants => 3.0,
        _ => 2.0,
    }
}

fn default_deficiency_thresholds() -> BTreeMap<GarmentType, f64> {
    GarmentType::ALL
        .iter()
        .map(|g| (*g, default_deficiency_threshold(*g)))
        .collect()
}

fn default_yield_every() -> usize {
    200
}
