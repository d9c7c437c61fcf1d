// ==========================================
// 校服尺码分配系统 - 裤长不足检查
// ==========================================
// 触发: 四个类别分配完成后统一扫描一次
// 口径: 裤长 - 已分配尺码数值 > 阈值（上衣/短袖裤 2,长袖裤 3）
// 红线: 只打标记、出报表,不触发重分配
// ==========================================

use crate::config::AllocationConfig;
use crate::domain::size_ladder::SizeLadder;
use crate::domain::student::StudentRecord;
use crate::domain::types::GarmentType;
use crate::engine::error::AllocationResult;
use crate::engine::size_rules::SizeRuleEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 裤长不足提示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficiencyFlag {
    pub student_id: String,
    pub garment_type: GarmentType,
    pub size: String,
    pub size_number: u32,
    pub pants_length: f64,
    /// 裤长 - 尺码数值
    pub gap: f64,
}

pub struct DeficiencyChecker;

impl DeficiencyChecker {
    /// 扫描全部学生的已分配尺码,写入 deficient 标记并返回提示列表
    pub fn check(
        students: &mut [StudentRecord],
        ladder: &SizeLadder,
        config: &AllocationConfig,
    ) -> AllocationResult<Vec<DeficiencyFlag>> {
        let mut flags = Vec::new();

        for garment in GarmentType::ALL {
            let threshold = config.deficiency_threshold(garment);
            for student in students.iter_mut() {
                let Some(pants_length) = student.pants_length.filter(|v| v.is_finite()) else {
                    continue;
                };
                let Some(size) = student.assignment(garment).size.clone() else {
                    continue;
                };

                let size_number = ladder.number_of(&size)?;
                let deficient =
                    SizeRuleEngine::is_length_deficient(pants_length, size_number, threshold);
                student.assignment_mut(garment).deficient = deficient;
                if deficient {
                    flags.push(DeficiencyFlag {
                        student_id: student.id.clone(),
                        garment_type: garment,
                        size,
                        size_number,
                        pants_length,
                        gap: pants_length - f64::from(size_number),
                    });
                }
            }
        }

        debug!(flag_count = flags.len(), "裤长不足检查完成");
        Ok(flags)
    }
}
