// ==========================================
// 校服尺码分配系统 - 统计汇总
// ==========================================
// 口径: 由最终学生记录全量重算,重复运行结果一致
// ==========================================

use crate::domain::statistics::AllocationStatistics;
use crate::domain::student::StudentRecord;
use crate::domain::types::{AdjustmentMark, GarmentType};

pub struct StatisticsCollector;

impl StatisticsCollector {
    /// 汇总单类别统计
    pub fn collect(garment: GarmentType, students: &[StudentRecord]) -> AllocationStatistics {
        let mut stats = AllocationStatistics::empty(garment);

        for student in students {
            let required = student.required_count(garment);
            if required == 0 {
                stats.skipped += 1;
                continue;
            }
            stats.demanding += 1;

            let assignment = student.assignment(garment);
            if assignment.is_assigned() {
                stats.allocated += 1;
                stats.units_allocated += required;

                match assignment.mark {
                    AdjustmentMark::None => {}
                    AdjustmentMark::Upsize => stats.upsized += 1,
                    AdjustmentMark::Downsize => stats.downsized += 1,
                    AdjustmentMark::Fallback => stats.fallback += 1,
                }
                if assignment.special {
                    stats.special += 1;
                } else if assignment.mark.is_adjusted() {
                    stats.adjusted += 1;
                } else if assignment.mark == AdjustmentMark::None {
                    stats.exact += 1;
                }
                if assignment.deficient {
                    stats.deficient += 1;
                }
            } else if let Some(reason) = assignment.failure {
                stats.failed += 1;
                *stats.failure_reasons.entry(reason).or_insert(0) += 1;
            }
        }

        stats
    }

    /// 汇总全部类别（按固定类别顺序）
    pub fn collect_all(students: &[StudentRecord]) -> Vec<AllocationStatistics> {
        GarmentType::ALL
            .iter()
            .map(|g| Self::collect(*g, students))
            .collect()
    }
}
