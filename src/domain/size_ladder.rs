// ==========================================
// 校服尺码分配系统 - 尺码序列 (Size Ladder)
// ==========================================
// 职责: 有序、无间隔的尺码标签序列;所有"相邻/距离/落档"均以下标表达
// 红线: 数值严格递增,标签不可重复
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 尺码序列错误
///
/// 注意: 标签不在序列上属于调用方编程错误,由类别边界统一捕获
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LadderError {
    #[error("尺码序列为空")]
    Empty,

    #[error("无法解析尺码数值: {0}")]
    InvalidLabel(String),

    #[error("尺码数值未严格递增: {prev} -> {label}")]
    NotIncreasing { prev: String, label: String },

    #[error("尺码标签重复: {0}")]
    DuplicateLabel(String),

    #[error("尺码不在序列上: {0}")]
    UnknownSize(String),
}

/// 单个尺码档位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderSize {
    pub label: String, // 如 "S/36"
    pub number: u32,   // 如 36
}

impl LadderSize {
    /// 从标签解析尺码数值
    ///
    /// 规则: 取最后一个 '/' 之后的数字;纯数字标签即为自身数值
    pub fn from_label(label: &str) -> Result<Self, LadderError> {
        let trimmed = label.trim();
        let numeric = trimmed.rsplit('/').next().unwrap_or(trimmed).trim();
        let number = numeric
            .parse::<u32>()
            .map_err(|_| LadderError::InvalidLabel(label.to_string()))?;
        Ok(Self {
            label: trimmed.to_string(),
            number,
        })
    }
}

// ==========================================
// SizeLadder - 尺码序列
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SizeLadder {
    sizes: Vec<LadderSize>,
}

impl SizeLadder {
    /// 创建尺码序列并校验单调性
    pub fn new(sizes: Vec<LadderSize>) -> Result<Self, LadderError> {
        if sizes.is_empty() {
            return Err(LadderError::Empty);
        }
        for i in 1..sizes.len() {
            if sizes[..i].iter().any(|s| s.label == sizes[i].label) {
                return Err(LadderError::DuplicateLabel(sizes[i].label.clone()));
            }
            if sizes[i].number <= sizes[i - 1].number {
                return Err(LadderError::NotIncreasing {
                    prev: sizes[i - 1].label.clone(),
                    label: sizes[i].label.clone(),
                });
            }
        }
        Ok(Self { sizes })
    }

    /// 从标签列表创建（数值由标签解析）
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, LadderError> {
        let sizes = labels
            .iter()
            .map(|l| LadderSize::from_label(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sizes)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn sizes(&self) -> &[LadderSize] {
        &self.sizes
    }

    /// 按序列顺序遍历标签
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sizes.iter().map(|s| s.label.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.sizes.iter().any(|s| s.label == label)
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.sizes.get(index).map(|s| s.label.as_str())
    }

    pub fn index_of(&self, label: &str) -> Result<usize, LadderError> {
        self.sizes
            .iter()
            .position(|s| s.label == label)
            .ok_or_else(|| LadderError::UnknownSize(label.to_string()))
    }

    pub fn number_of(&self, label: &str) -> Result<u32, LadderError> {
        let idx = self.index_of(label)?;
        Ok(self.sizes[idx].number)
    }

    /// 数值落档: 取数值 ≥ 输入的最小尺码;超出最大尺码时返回最大尺码
    pub fn bucketize(&self, number: f64) -> &str {
        self.sizes
            .iter()
            .find(|s| f64::from(s.number) >= number)
            .unwrap_or_else(|| &self.sizes[self.sizes.len() - 1])
            .label
            .as_str()
    }

    /// 大一码（已是最大码时返回自身）
    pub fn next(&self, label: &str) -> Result<&str, LadderError> {
        let idx = self.index_of(label)?;
        let next_idx = (idx + 1).min(self.sizes.len() - 1);
        Ok(self.sizes[next_idx].label.as_str())
    }

    /// 小一码（已是最小码时返回自身）
    pub fn previous(&self, label: &str) -> Result<&str, LadderError> {
        let idx = self.index_of(label)?;
        Ok(self.sizes[idx.saturating_sub(1)].label.as_str())
    }

    pub fn smallest(&self) -> &str {
        self.sizes[0].label.as_str()
    }

    pub fn largest(&self) -> &str {
        self.sizes[self.sizes.len() - 1].label.as_str()
    }
}

impl TryFrom<Vec<String>> for SizeLadder {
    type Error = LadderError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_labels(&labels)
    }
}

impl From<SizeLadder> for Vec<String> {
    fn from(ladder: SizeLadder) -> Self {
        ladder.sizes.into_iter().map(|s| s.label).collect()
    }
}

impl Default for SizeLadder {
    /// 默认尺码序列（学校未配置时使用）
    fn default() -> Self {
        let sizes = DEFAULT_LADDER_LABELS
            .iter()
            .filter_map(|l| LadderSize::from_label(l).ok())
            .collect();
        Self { sizes }
    }
}

/// 默认尺码标签
pub const DEFAULT_LADDER_LABELS: [&str; 12] = [
    "XS/34", "S/36", "M/38", "L/40", "XL/42", "2XL/44", "3XL/46", "4XL/48", "5XL/50", "6XL/52",
    "7XL/54", "8XL/56",
];
