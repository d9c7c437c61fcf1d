// ==========================================
// 校服尺码分配系统 - 引擎层
// ==========================================
// 职责: 预留重算、按类别分配、裤长检查、统计
// 红线: 引擎不做 I/O,不拼 SQL;学生级失败必须输出 FailureReason
// ==========================================

pub mod category_pass;
pub mod context;
pub mod deficiency;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod pants_allocator;
pub mod shirt_allocator;
pub mod shortage;
pub mod size_rules;
pub mod statistics;

// 重导出核心引擎
pub use category_pass::{CategoryAllocator, CategoryPassSummary};
pub use context::{AllocationContext, AllocationInput, RunPhase};
pub use deficiency::{DeficiencyChecker, DeficiencyFlag};
pub use error::{AllocationError, AllocationResult};
pub use ledger::{InventoryLedger, ReservationSummary};
pub use orchestrator::{AllocationEngine, AllocationOutcome, CategoryOutcome, CategoryReport};
pub use pants_allocator::PantsAllocator;
pub use shirt_allocator::ShirtAllocator;
pub use shortage::{ShortageEntry, ShortageReporter};
pub use size_rules::{ShirtTargets, SizeRuleEngine};
pub use statistics::StatisticsCollector;
