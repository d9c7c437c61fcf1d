// ==========================================
// 校服尺码分配系统 - 缺货报表
// ==========================================
// 口径: 仅统计库存短缺类失败,按规则目标尺码归集,用于补货
// ==========================================

use crate::domain::student::StudentRecord;
use crate::domain::types::GarmentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个 (类别, 尺码) 的缺口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortageEntry {
    pub garment_type: GarmentType,
    pub size: String,
    pub students: u32,
    pub units: u32,
}

pub struct ShortageReporter;

impl ShortageReporter {
    /// 按类别顺序、尺码序列顺序输出缺口
    pub fn collect(students: &[StudentRecord], ladder_order: &[String]) -> Vec<ShortageEntry> {
        let mut grouped: BTreeMap<(GarmentType, usize, String), (u32, u32)> = BTreeMap::new();

        for garment in GarmentType::ALL {
            for student in students {
                let assignment = student.assignment(garment);
                if assignment.is_assigned() {
                    continue;
                }
                let (Some(reason), Some(target)) = (assignment.failure, &assignment.target_size)
                else {
                    continue;
                };
                if !reason.is_stock_shortage() {
                    continue;
                }
                let rank = ladder_order
                    .iter()
                    .position(|s| s == target)
                    .unwrap_or(usize::MAX);
                let entry = grouped
                    .entry((garment, rank, target.clone()))
                    .or_insert((0, 0));
                entry.0 += 1;
                entry.1 += student.required_count(garment);
            }
        }

        grouped
            .into_iter()
            .map(|((garment_type, _, size), (students, units))| ShortageEntry {
                garment_type,
                size,
                students,
                units,
            })
            .collect()
    }
}
