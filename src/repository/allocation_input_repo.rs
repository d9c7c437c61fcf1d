// ==========================================
// 校服尺码分配系统 - 分配输入仓储
// ==========================================
// 表: student_roster + inventory_cell + manual_override
// 红线: 三张表在同一事务内整体替换,任一写入失败则全部回滚
// ==========================================

use crate::engine::AllocationInput;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::student_repo::StudentRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 输入写入计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputWriteSummary {
    pub students: usize,
    pub inventory_cells: usize,
    pub overrides: usize,
}

pub struct AllocationInputRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationInputRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换名册、库存快照与人工覆写（单事务）
    pub fn save_input(&self, input: &AllocationInput) -> RepositoryResult<InputWriteSummary> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let summary = InputWriteSummary {
            students: StudentRepository::save_all_tx(&tx, &input.students)?,
            inventory_cells: InventoryRepository::save_snapshot_tx(&tx, &input.inventory)?,
            overrides: InventoryRepository::save_overrides_tx(&tx, &input.manual_overrides)?,
        };

        tx.commit()?;
        Ok(summary)
    }
}
