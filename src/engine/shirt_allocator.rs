// ==========================================
// 校服尺码分配系统 - 上衣分配器（短袖/长袖同规则）
// ==========================================
// 流程:
// 1) 按有效胸围升序、裤长升序排序
// 2) 第一阶段: 首选尺码 → 备选尺码 → 女生降码
// 3) 第二阶段: 第一阶段未分配者按"当前最大库存尺码"贪心兜底
// 红线:
// - 每名学生只在最终尺码上扣减一次
// - 降码目标无库存即失败,不回退原尺码,也不进入第二阶段
// ==========================================

use crate::config::ShirtRuleSet;
use crate::domain::size_ladder::SizeLadder;
use crate::domain::student::{Measurements, StudentRecord};
use crate::domain::types::{AdjustmentMark, FailureReason, GarmentType};
use crate::engine::category_pass::{yield_point, CategoryAllocator, CategoryPassSummary};
use crate::engine::error::AllocationResult;
use crate::engine::ledger::InventoryLedger;
use crate::engine::size_rules::SizeRuleEngine;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// 第一阶段结果
#[derive(Debug, Clone, PartialEq, Eq)]
enum PhaseOneOutcome {
    Accepted { size: String, mark: AdjustmentMark },
    /// 失败;fallback_eligible 表示可进入第二阶段
    Failed {
        reason: FailureReason,
        fallback_eligible: bool,
    },
}

// ==========================================
// ShirtAllocator - 上衣分配器
// ==========================================
pub struct ShirtAllocator {
    garment: GarmentType,
    ladder: SizeLadder,
    rules: ShirtRuleSet,
}

impl ShirtAllocator {
    pub fn new(garment: GarmentType, ladder: SizeLadder, rules: ShirtRuleSet) -> Self {
        Self {
            garment,
            ladder,
            rules,
        }
    }

    /// 上衣排序: 有效胸围升序,裤长升序,稳定
    fn sort_indices(&self, students: &[StudentRecord], mut indices: Vec<usize>) -> Vec<usize> {
        let key = |idx: &usize| {
            students[*idx]
                .measurements()
                .map(|m| (m.effective_chest(), m.pants_length))
                .unwrap_or((f64::MAX, f64::MAX))
        };
        indices.sort_by(|a, b| {
            let (ka, kb) = (key(a), key(b));
            ka.0.total_cmp(&kb.0).then_with(|| ka.1.total_cmp(&kb.1))
        });
        indices
    }

    /// 在起始尺码上解析候选（只检查库存,不扣减）
    ///
    /// # 返回
    /// - Some((尺码, 是否放码)): 起始尺码有库存
    /// - None: 起始尺码库存不足
    fn resolve_candidate(
        &self,
        ledger: &InventoryLedger,
        start: &str,
        count: u32,
        pants_length: f64,
    ) -> AllocationResult<Option<(String, bool)>> {
        if !ledger.has_stock(self.garment, start, count) {
            return Ok(None);
        }

        let number = self.ladder.number_of(start)?;
        if SizeRuleEngine::needs_upsize(pants_length, number, self.rules.upsize_length_gap) {
            let next = self.ladder.next(start)?;
            if next != start && ledger.has_stock(self.garment, next, count) {
                return Ok(Some((next.to_string(), true)));
            }
        }
        Ok(Some((start.to_string(), false)))
    }

    /// 第一阶段: 首选 → 备选 → 降码 → 扣减
    fn phase_one(
        &self,
        student: &mut StudentRecord,
        m: Measurements,
        count: u32,
        ledger: &mut InventoryLedger,
    ) -> AllocationResult<PhaseOneOutcome> {
        let targets = SizeRuleEngine::shirt_targets(
            &self.ladder,
            &self.rules,
            student.gender,
            m.effective_chest(),
        )?;
        student.assignment_mut(self.garment).target_size = Some(targets.preferred.clone());

        let resolved = self.resolve_candidate(ledger, &targets.preferred, count, m.pants_length)?;
        let chosen = match resolved {
            Some((size, upsized)) => Some((
                size,
                if upsized {
                    AdjustmentMark::Upsize
                } else {
                    AdjustmentMark::None
                },
            )),
            None => self
                .resolve_candidate(ledger, &targets.alternative, count, m.pants_length)?
                .map(|(size, _)| (size, AdjustmentMark::Upsize)),
        };

        let Some((mut size, mut mark)) = chosen else {
            return Ok(PhaseOneOutcome::Failed {
                reason: FailureReason::InsufficientStock,
                fallback_eligible: true,
            });
        };

        if let Some(rule) = &self.rules.downgrade {
            let number = self.ladder.number_of(&size)?;
            if SizeRuleEngine::should_downgrade(rule, student.gender, number, m.pants_length) {
                let previous = self.ladder.previous(&size)?;
                if previous != size {
                    if ledger.has_stock(self.garment, previous, count) {
                        size = previous.to_string();
                        mark = AdjustmentMark::Downsize;
                    } else {
                        return Ok(PhaseOneOutcome::Failed {
                            reason: FailureReason::DowngradeUnavailable,
                            fallback_eligible: false,
                        });
                    }
                }
            }
        }

        if ledger.try_decrement(self.garment, &size, count) {
            Ok(PhaseOneOutcome::Accepted { size, mark })
        } else {
            Ok(PhaseOneOutcome::Failed {
                reason: FailureReason::InsufficientStock,
                fallback_eligible: true,
            })
        }
    }

    /// 第二阶段: 当前最大库存尺码 + 裤长放码检查
    ///
    /// # 返回
    /// - Some((尺码, 标记)): 分配成功
    /// - None: 库存不足
    fn phase_two(
        &self,
        m: Measurements,
        count: u32,
        ledger: &mut InventoryLedger,
    ) -> AllocationResult<Option<(String, AdjustmentMark)>> {
        let Some(best) = ledger.best_available(self.garment) else {
            return Ok(None);
        };

        let Some((size, upsized)) = self.resolve_candidate(ledger, &best, count, m.pants_length)?
        else {
            return Ok(None);
        };

        if ledger.try_decrement(self.garment, &size, count) {
            let mark = if upsized {
                AdjustmentMark::Upsize
            } else {
                AdjustmentMark::None
            };
            Ok(Some((size, mark)))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl CategoryAllocator for ShirtAllocator {
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
        let mut pending = Vec::new();

        // ===== 第一阶段: 规则尺码 =====
        for (processed, &idx) in order.iter().enumerate() {
            yield_point(processed, yield_every).await;

            let student = &mut students[idx];
            let count = student.required_count(self.garment);
            let Some(m) = student.measurements() else {
                student.assignment_mut(self.garment).failure =
                    Some(FailureReason::MissingMeasurements);
                summary.processed += 1;
                summary.failed += 1;
                continue;
            };

            match self.phase_one(student, m, count, ledger)? {
                PhaseOneOutcome::Accepted { size, mark } => {
                    let assignment = student.assignment_mut(self.garment);
                    assignment.size = Some(size);
                    assignment.mark = mark;
                    summary.processed += 1;
                    summary.allocated += 1;
                }
                PhaseOneOutcome::Failed {
                    reason,
                    fallback_eligible,
                } => {
                    student.assignment_mut(self.garment).failure = Some(reason);
                    if fallback_eligible {
                        pending.push(idx);
                    } else {
                        summary.processed += 1;
                        summary.failed += 1;
                    }
                }
            }
        }

        debug!(
            garment_type = %self.garment,
            phase_one_allocated = summary.allocated,
            pending = pending.len(),
            "第一阶段完成"
        );

        // ===== 第二阶段: 最大库存兜底 =====
        for (processed, &idx) in pending.iter().enumerate() {
            yield_point(processed, yield_every).await;

            let student = &mut students[idx];
            let count = student.required_count(self.garment);
            summary.processed += 1;
            summary.fallback_attempted += 1;

            let Some(m) = student.measurements() else {
                summary.failed += 1;
                continue;
            };

            match self.phase_two(m, count, ledger)? {
                Some((size, mark)) => {
                    let assignment = student.assignment_mut(self.garment);
                    assignment.size = Some(size);
                    assignment.mark = mark;
                    assignment.special = true;
                    assignment.failure = None;
                    summary.allocated += 1;
                    summary.fallback_allocated += 1;
                }
                None => {
                    student.assignment_mut(self.garment).failure =
                        Some(FailureReason::InsufficientStock);
                    summary.failed += 1;
                }
            }
        }

        debug!(
            garment_type = %self.garment,
            allocated = summary.allocated,
            failed = summary.failed,
            fallback_allocated = summary.fallback_allocated,
            "上衣分配完成"
        );

        Ok(summary)
    }
}
