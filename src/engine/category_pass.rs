// ==========================================
// 校服尺码分配系统 - 类别分配通用部件
// ==========================================
// 职责: 类别分配器接口、单类别分配摘要、协作式让出执行权
// ==========================================

use crate::domain::student::StudentRecord;
use crate::domain::types::GarmentType;
use crate::engine::error::AllocationResult;
use crate::engine::ledger::InventoryLedger;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 单类别分配摘要（由各类别分配器返回）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryPassSummary {
    pub processed: u32,
    pub allocated: u32,
    pub failed: u32,
    /// 进入第二阶段兜底的人数（仅上衣）
    pub fallback_attempted: u32,
    pub fallback_allocated: u32,
}

// ==========================================
// CategoryAllocator - 类别分配器接口
// ==========================================
// 分配器只处理"需要且测量齐全"的学生下标;
// 清空、零需求跳过、缺台账、缺测量均由编排器在调用前处理
#[async_trait]
pub trait CategoryAllocator: Send + Sync {
    fn garment_type(&self) -> GarmentType;

    /// 对给定学生下标执行分配
    ///
    /// # 参数
    /// - `students`: 全体学生（只写本类别结果）
    /// - `eligible`: 待分配学生下标（未排序）
    /// - `ledger`: 库存台账（唯一扣减入口）
    /// - `yield_every`: 每处理多少名学生让出一次执行权
    async fn allocate(
        &self,
        students: &mut [StudentRecord],
        eligible: Vec<usize>,
        ledger: &mut InventoryLedger,
        yield_every: usize,
    ) -> AllocationResult<CategoryPassSummary>;
}

/// 每处理 every 名学生让出一次执行权（every = 0 时不让出）
pub async fn yield_point(processed: usize, every: usize) {
    if every > 0 && processed > 0 && processed % every == 0 {
        tokio::task::yield_now().await;
    }
}
