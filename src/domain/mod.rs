// ==========================================
// 校服尺码分配系统 - 领域模型层
// ==========================================
// 职责: 定义尺码序列、学生、库存、预留策略、统计等领域实体
// 红线: 不含数据访问逻辑,不含分配流程
// ==========================================

pub mod inventory;
pub mod reservation;
pub mod size_ladder;
pub mod statistics;
pub mod student;
pub mod types;

// 重导出核心类型
pub use inventory::{
    snapshot_from_totals, DemandByType, InventoryCell, InventorySnapshot, ManualOverrides,
};
pub use reservation::{ReservationBase, ReservationPolicy};
pub use size_ladder::{LadderError, LadderSize, SizeLadder, DEFAULT_LADDER_LABELS};
pub use statistics::AllocationStatistics;
pub use student::{
    CategoryAssignment, GarmentCounts, Measurements, StudentAssignments, StudentRecord,
};
pub use types::{AdjustmentMark, FailureReason, GarmentType, Gender};
