// ==========================================
// 校服尺码分配系统 - 裤子分配器（短袖/长袖同规则）
// ==========================================
// 流程:
// 1) 按腰围升序、胸围升序排序（与上衣排序相互独立）
// 2) 一次性构建有库存尺码列表（按序列顺序）
// 3) 目标 = 腰围 × 系数;取可用尺码中满足的最小码,否则最大码
// 4) 库存不足时先向大码、再向小码搜索
// 5) 裤长放码: 下一码有库存则放码(↑),否则保留原码并标记 *
// ==========================================

use crate::config::PantsRuleSet;
use crate::domain::size_ladder::SizeLadder;
use crate::domain::student::StudentRecord;
use crate::domain::types::{AdjustmentMark, FailureReason, GarmentType};
use crate::engine::category_pass::{yield_point, CategoryAllocator, CategoryPassSummary};
use crate::engine::error::AllocationResult;
use crate::engine::ledger::InventoryLedger;
use crate::engine::size_rules::SizeRuleEngine;
use async_trait::async_trait;
use tracing::{debug, instrument};

// ==========================================
// PantsAllocator - 裤子分配器
// ==========================================
pub struct PantsAllocator {
    garment: GarmentType,
    ladder: SizeLadder,
    rules: PantsRuleSet,
}

impl PantsAllocator {
    pub fn new(garment: GarmentType, ladder: SizeLadder, rules: PantsRuleSet) -> Self {
        Self {
            garment,
            ladder,
            rules,
        }
    }

    /// 裤子排序: 腰围升序,胸围升序,稳定
    fn sort_indices(&self, students: &[StudentRecord], mut indices: Vec<usize>) -> Vec<usize> {
        let key = |idx: &usize| {
            let s = &students[*idx];
            (s.waist.unwrap_or(f64::MAX), s.chest.unwrap_or(f64::MAX))
        };
        indices.sort_by(|a, b| {
            let (ka, kb) = (key(a), key(b));
            ka.0.total_cmp(&kb.0).then_with(|| ka.1.total_cmp(&kb.1))
        });
        indices
    }

    /// 在可用尺码中从 start 开始寻找库存充足的尺码: 先向大码,再向小码
    fn search_with_stock(
        &self,
        ledger: &InventoryLedger,
        available: &[String],
        start: usize,
        count: u32,
    ) -> Option<usize> {
        if ledger.has_stock(self.garment, &available[start], count) {
            return Some(start);
        }
        let forward = (start + 1..available.len())
            .find(|&i| ledger.has_stock(self.garment, &available[i], count));
        forward.or_else(|| {
            (0..start)
                .rev()
                .find(|&i| ledger.has_stock(self.garment, &available[i], count))
        })
    }

    /// 单名学生分配
    ///
    /// # 返回
    /// - Ok(Ok((尺码, 标记))): 分配成功
    /// - Ok(Err(原因)): 学生级失败
    fn allocate_one(
        &self,
        student: &mut StudentRecord,
        available: &[String],
        ledger: &mut InventoryLedger,
    ) -> AllocationResult<Result<(String, AdjustmentMark), FailureReason>> {
        let Some(m) = student.measurements() else {
            return Ok(Err(FailureReason::MissingMeasurements));
        };
        let count = student.required_count(self.garment);

        let Some(target) = SizeRuleEngine::pants_target_number(&self.rules, m.waist) else {
            return Ok(Err(FailureReason::NoQualifyingSize));
        };
        let Some(picked) = SizeRuleEngine::pick_pants_index(&self.ladder, available, target)?
        else {
            return Ok(Err(FailureReason::NoQualifyingSize));
        };
        student.assignment_mut(self.garment).target_size = Some(available[picked].clone());

        let Some(chosen) = self.search_with_stock(ledger, available, picked, count) else {
            return Ok(Err(FailureReason::InsufficientStock));
        };

        let mut size = available[chosen].clone();
        let mut mark = AdjustmentMark::None;
        let number = self.ladder.number_of(&size)?;
        if SizeRuleEngine::needs_upsize(m.pants_length, number, self.rules.upsize_length_gap) {
            let next = self.ladder.next(&size)?;
            if next != size && ledger.has_stock(self.garment, next, count) {
                size = next.to_string();
                mark = AdjustmentMark::Upsize;
            } else {
                mark = AdjustmentMark::Fallback;
            }
        }

        if ledger.try_decrement(self.garment, &size, count) {
            Ok(Ok((size, mark)))
        } else {
            Ok(Err(FailureReason::InsufficientStock))
        }
    }
}

#[async_trait]
impl CategoryAllocator for PantsAllocator {
    fn garment_type(&self) -> GarmentType {
        self.garment
    }

    #[instrument(skip(self, students, eligible, ledger), fields(
        garment_type = %self.garment,
        eligible_count = eligible.len()
    ))]
    async fn allocate(
        &self,
        students: &mut [StudentRecord],
        eligible: Vec<usize>,
        ledger: &mut InventoryLedger,
        yield_every: usize,
    ) -> AllocationResult<CategoryPassSummary> {
        let mut summary = CategoryPassSummary::default();
        let order = self.sort_indices(students, eligible);
        let available = ledger.available_sizes(self.garment);

        debug!(
            garment_type = %self.garment,
            available_sizes = available.len(),
            "可用尺码列表已构建"
        );

        for (processed, &idx) in order.iter().enumerate() {
            yield_point(processed, yield_every).await;

            let student = &mut students[idx];
            match self.allocate_one(student, &available, ledger)? {
                Ok((size, mark)) => {
                    let assignment = student.assignment_mut(self.garment);
                    assignment.size = Some(size);
                    assignment.mark = mark;
                    summary.processed += 1;
                    summary.allocated += 1;
                }
                Err(reason) => {
                    student.assignment_mut(self.garment).failure = Some(reason);
                    summary.processed += 1;
                    summary.failed += 1;
                }
            }
        }

        debug!(
            garment_type = %self.garment,
            allocated = summary.allocated,
            failed = summary.failed,
            "裤子分配完成"
        );

        Ok(summary)
    }
}
