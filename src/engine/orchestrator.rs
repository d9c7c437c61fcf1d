// ==========================================
// 校服尺码分配系统 - 分配引擎编排器
// ==========================================
// 运行阶段:
// Idle → ReservationsRecomputed → 短袖上衣 → 短袖裤 → 长袖上衣 → 长袖裤
//      → DeficiencyChecked → Done
// 红线:
// - 每个类别相互隔离: 类别内部 Err 只导致该类别失败,后续类别照常执行
// - 台账在运行期间由上下文独占;调用方只在 Done 之后拿到快照
// - 重复运行安全: 每次运行先 reset + 重算预留,并清空各类别结果
// ==========================================

use crate::config::{AllocationConfig, AllocationConfigReader};
use crate::domain::inventory::{InventorySnapshot, ManualOverrides};
use crate::domain::statistics::AllocationStatistics;
use crate::domain::student::StudentRecord;
use crate::domain::types::{FailureReason, GarmentType};
use crate::engine::category_pass::{CategoryAllocator, CategoryPassSummary};
use crate::engine::context::{AllocationContext, AllocationInput, RunPhase};
use crate::engine::deficiency::{DeficiencyChecker, DeficiencyFlag};
use crate::engine::error::{AllocationError, AllocationResult};
use crate::engine::ledger::ReservationSummary;
use crate::engine::pants_allocator::PantsAllocator;
use crate::engine::shirt_allocator::ShirtAllocator;
use crate::engine::shortage::{ShortageEntry, ShortageReporter};
use crate::engine::statistics::StatisticsCollector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 类别执行结果
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryOutcome {
    /// 无人需要该类别
    Skipped,
    /// 有需求但无该类别库存台账,全部需求学生记为失败
    MissingInventory { failed: u32 },
    Completed { summary: CategoryPassSummary },
    /// 类别内部错误;该类别结果已清空
    Failed { error: String },
}

impl CategoryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CategoryOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub garment_type: GarmentType,
    pub outcome: CategoryOutcome,
}

// ==========================================
// AllocationOutcome - 运行报告
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    pub students: Vec<StudentRecord>,
    pub inventory: InventorySnapshot,
    #[serde(default)]
    pub manual_overrides: ManualOverrides,

    pub reservations: Vec<ReservationSummary>,
    pub categories: Vec<CategoryReport>,
    pub statistics: Vec<AllocationStatistics>,
    pub deficiencies: Vec<DeficiencyFlag>,
    pub shortages: Vec<ShortageEntry>,
}

impl AllocationOutcome {
    pub fn statistics_for(&self, garment: GarmentType) -> Option<&AllocationStatistics> {
        self.statistics.iter().find(|s| s.garment_type == garment)
    }

    pub fn category(&self, garment: GarmentType) -> Option<&CategoryOutcome> {
        self.categories
            .iter()
            .find(|c| c.garment_type == garment)
            .map(|c| &c.outcome)
    }

    /// 学生 × 类别 的失败总数
    pub fn failed_count(&self) -> u32 {
        self.statistics.iter().map(|s| s.failed).sum()
    }

    /// 以本次结果作为下一次运行的输入（人工覆写后重跑）
    pub fn into_input(self) -> AllocationInput {
        AllocationInput {
            students: self.students,
            inventory: self.inventory,
            manual_overrides: self.manual_overrides,
        }
    }

    /// 文本摘要
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "分配运行 {} ({} 名学生, 耗时 {} ms)",
            self.run_id,
            self.students.len(),
            (self.finished_at - self.started_at).num_milliseconds()
        );
        for stats in &self.statistics {
            let status = match self.category(stats.garment_type) {
                Some(CategoryOutcome::Skipped) => "跳过",
                Some(CategoryOutcome::MissingInventory { .. }) => "无库存",
                Some(CategoryOutcome::Failed { .. }) => "失败",
                _ => "完成",
            };
            let _ = writeln!(
                out,
                "- {} [{}]: 需求 {} 人, 分配 {} 人 (调整 {}, 兜底 {}), 失败 {} 人, 成功率 {:.1}%",
                stats.garment_type.title_cn(),
                status,
                stats.demanding,
                stats.allocated,
                stats.adjusted,
                stats.special,
                stats.failed,
                stats.success_rate() * 100.0
            );
        }
        let _ = writeln!(out, "裤长不足提示: {} 条", self.deficiencies.len());
        for flag in &self.deficiencies {
            let display = self
                .students
                .iter()
                .find(|s| s.id == flag.student_id)
                .map(|s| s.assignment(flag.garment_type).display_size())
                .unwrap_or_else(|| flag.size.clone());
            let _ = writeln!(
                out,
                "  {} {} {}: 裤长 {} 超出 {:.1}",
                flag.student_id,
                flag.garment_type.title_cn(),
                display,
                flag.pants_length,
                flag.gap
            );
        }
        if !self.shortages.is_empty() {
            let _ = writeln!(out, "缺货:");
            for entry in &self.shortages {
                let _ = writeln!(
                    out,
                    "  {} {}: {} 人 / {} 件",
                    entry.garment_type.title_cn(),
                    entry.size,
                    entry.students,
                    entry.units
                );
            }
        }
        out
    }
}

// ==========================================
// AllocationEngine - 分配引擎
// ==========================================

pub struct AllocationEngine<C>
where
    C: AllocationConfigReader,
{
    config: Arc<C>,
}

impl<C> AllocationEngine<C>
where
    C: AllocationConfigReader,
{
    /// 创建新的引擎实例
    ///
    /// # 参数
    /// - config: 配置读取器
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }

    /// 执行一次完整分配
    ///
    /// # 返回
    /// - Ok(AllocationOutcome): 运行完成（类别失败记录在报告中）
    /// - Err: 配置无法加载,运行未开始
    #[instrument(skip(self, input), fields(students = input.students.len()))]
    pub async fn run(&self, input: AllocationInput) -> AllocationResult<AllocationOutcome> {
        let config = self
            .config
            .load_allocation_config()
            .await
            .map_err(|e| AllocationError::Config(e.to_string()))?;
        self.run_with_config(input, &config).await
    }

    /// 使用已加载的配置执行分配
    pub async fn run_with_config(
        &self,
        input: AllocationInput,
        config: &AllocationConfig,
    ) -> AllocationResult<AllocationOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            students = input.students.len(),
            garment_types = input.inventory.len(),
            "开始执行分配"
        );

        let ladder = config.size_ladder.clone();
        let mut ctx = AllocationContext::new(input, ladder.clone());

        // ==========================================
        // 步骤1: 重置台账并重算预留
        // ==========================================
        let demand = ctx.demand_by_type();
        ctx.ledger.reset_all();
        let reservations = ctx.ledger.recompute_reservations(
            &demand,
            &ctx.manual_overrides,
            &config.reservation_policies,
        );
        ctx.advance(RunPhase::ReservationsRecomputed);

        // ==========================================
        // 步骤2: 按固定顺序逐类别分配
        // ==========================================
        let mut categories = Vec::with_capacity(GarmentType::ALL.len());
        for garment in GarmentType::ALL {
            ctx.advance(RunPhase::Category(garment));
            let allocator = Self::allocator_for(garment, config);
            let outcome = Self::run_category(&mut ctx, allocator.as_ref(), config).await;
            categories.push(CategoryReport {
                garment_type: garment,
                outcome,
            });
            tokio::task::yield_now().await;
        }

        // ==========================================
        // 步骤3: 裤长不足检查
        // ==========================================
        let deficiencies = match DeficiencyChecker::check(&mut ctx.students, &ladder, config) {
            Ok(flags) => flags,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "裤长不足检查失败");
                Vec::new()
            }
        };
        ctx.advance(RunPhase::DeficiencyChecked);

        // ==========================================
        // 步骤4: 统计与缺货报表
        // ==========================================
        let statistics = StatisticsCollector::collect_all(&ctx.students);
        let ladder_order: Vec<String> = ladder.labels().map(str::to_string).collect();
        let shortages = ShortageReporter::collect(&ctx.students, &ladder_order);

        if !ctx.ledger.is_conserved() {
            warn!(run_id = %run_id, "库存守恒检查未通过");
        }
        ctx.advance(RunPhase::Done);

        let (students, inventory, manual_overrides) = ctx.into_parts();
        let outcome = AllocationOutcome {
            run_id,
            started_at,
            finished_at: Utc::now(),
            students,
            inventory,
            manual_overrides,
            reservations,
            categories,
            statistics,
            deficiencies,
            shortages,
        };

        info!(
            run_id = %outcome.run_id,
            failed = outcome.failed_count(),
            deficiencies = outcome.deficiencies.len(),
            shortages = outcome.shortages.len(),
            "分配完成"
        );

        Ok(outcome)
    }

    fn allocator_for(
        garment: GarmentType,
        config: &AllocationConfig,
    ) -> Box<dyn CategoryAllocator> {
        if garment.is_shirt() {
            Box::new(ShirtAllocator::new(
                garment,
                config.size_ladder.clone(),
                config.shirt_rules.clone(),
            ))
        } else {
            Box::new(PantsAllocator::new(
                garment,
                config.size_ladder.clone(),
                config.pants_rules,
            ))
        }
    }

    /// 单类别执行: 清空 → 跳过判定 → 台账判定 → 测量判定 → 分配
    async fn run_category(
        ctx: &mut AllocationContext,
        allocator: &dyn CategoryAllocator,
        config: &AllocationConfig,
    ) -> CategoryOutcome {
        let garment = allocator.garment_type();
        ctx.clear_category(garment);

        let demanding: Vec<usize> = ctx
            .students
            .iter()
            .enumerate()
            .filter(|(_, s)| s.required_count(garment) > 0)
            .map(|(idx, _)| idx)
            .collect();

        if demanding.is_empty() {
            debug!(garment_type = %garment, "无需求,跳过");
            return CategoryOutcome::Skipped;
        }

        if !ctx.ledger.has_type(garment) {
            warn!(
                garment_type = %garment,
                students = demanding.len(),
                "无该类别库存台账"
            );
            for &idx in &demanding {
                ctx.students[idx].assignment_mut(garment).failure =
                    Some(FailureReason::MissingInventory);
            }
            return CategoryOutcome::MissingInventory {
                failed: demanding.len() as u32,
            };
        }

        let mut missing = 0u32;
        let mut eligible = Vec::with_capacity(demanding.len());
        for idx in demanding {
            if ctx.students[idx].measurements().is_some() {
                eligible.push(idx);
            } else {
                ctx.students[idx].assignment_mut(garment).failure =
                    Some(FailureReason::MissingMeasurements);
                missing += 1;
            }
        }

        let result = allocator
            .allocate(&mut ctx.students, eligible, &mut ctx.ledger, config.yield_every)
            .await;

        match result {
            Ok(mut summary) => {
                summary.processed += missing;
                summary.failed += missing;
                info!(
                    garment_type = %garment,
                    allocated = summary.allocated,
                    failed = summary.failed,
                    fallback_allocated = summary.fallback_allocated,
                    "类别分配完成"
                );
                CategoryOutcome::Completed { summary }
            }
            Err(e) => {
                error!(
                    garment_type = %garment,
                    phase = ?ctx.phase(),
                    error = %e,
                    "类别分配失败,结果已清空"
                );
                ctx.ledger.reset(garment);
                ctx.clear_category(garment);
                CategoryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
