// ==========================================
// 校服尺码分配系统 - 库存数据仓储
// ==========================================
// 表: inventory_cell（类别 × 尺码库存快照）、manual_override（人工覆写）
// 红线: Repository 不含业务逻辑,预留计算只在引擎台账中进行
// ==========================================

use crate::domain::inventory::{InventoryCell, InventorySnapshot, ManualOverrides};
use crate::domain::types::GarmentType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Transaction};
use std::sync::{Arc, Mutex};

/// 解析 garment_type 列
fn parse_garment(value: &str) -> RepositoryResult<GarmentType> {
    value
        .parse::<GarmentType>()
        .map_err(|message| RepositoryError::FieldValueError {
            field: "garment_type".to_string(),
            message,
        })
}

// ==========================================
// InventoryRepository - 库存仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换库存快照
    ///
    /// # 返回
    /// - Ok(usize): 写入的单元数
    pub fn save_snapshot(&self, snapshot: &InventorySnapshot) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let written = Self::save_snapshot_tx(&tx, snapshot)?;

        tx.commit()?;
        Ok(written)
    }

    /// 在调用方事务内整体替换库存快照（不提交）
    pub(crate) fn save_snapshot_tx(
        tx: &Transaction,
        snapshot: &InventorySnapshot,
    ) -> RepositoryResult<usize> {
        tx.execute("DELETE FROM inventory_cell", [])?;

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO inventory_cell (
                garment_type, size_label, total, reserved, allocatable, allocated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        let mut written = 0;
        for (garment, sizes) in snapshot {
            for (size, cell) in sizes {
                written += stmt.execute(params![
                    garment.as_str(),
                    size,
                    cell.total,
                    cell.reserved,
                    cell.allocatable,
                    cell.allocated,
                ])?;
            }
        }
        Ok(written)
    }

    /// 读取库存快照
    pub fn load_snapshot(&self) -> RepositoryResult<InventorySnapshot> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT garment_type, size_label, total, reserved, allocatable, allocated
            FROM inventory_cell
            ORDER BY garment_type, size_label
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    InventoryCell {
                        total: row.get(2)?,
                        reserved: row.get(3)?,
                        allocatable: row.get(4)?,
                        allocated: row.get(5)?,
                    },
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut snapshot = InventorySnapshot::new();
        for (garment, size, cell) in rows {
            snapshot
                .entry(parse_garment(&garment)?)
                .or_default()
                .insert(size, cell);
        }
        Ok(snapshot)
    }

    // ==========================================
    // 人工覆写
    // ==========================================

    /// 设置单个尺码的人工可分配量（覆盖已有值）
    pub fn set_override(
        &self,
        garment: GarmentType,
        size: &str,
        allocatable: u32,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO manual_override (garment_type, size_label, allocatable, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(garment_type, size_label) DO UPDATE SET
                allocatable = excluded.allocatable,
                updated_at = excluded.updated_at
            "#,
            params![garment.as_str(), size, allocatable],
        )?;
        Ok(())
    }

    /// 清除单个尺码的人工覆写
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 原本不存在
    pub fn clear_override(&self, garment: GarmentType, size: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM manual_override WHERE garment_type = ?1 AND size_label = ?2",
            params![garment.as_str(), size],
        )?;
        Ok(affected > 0)
    }

    /// 在调用方事务内整体替换人工覆写（不提交）
    pub(crate) fn save_overrides_tx(
        tx: &Transaction,
        overrides: &ManualOverrides,
    ) -> RepositoryResult<usize> {
        tx.execute("DELETE FROM manual_override", [])?;

        let mut stmt = tx.prepare(
            "INSERT INTO manual_override (garment_type, size_label, allocatable) VALUES (?1, ?2, ?3)",
        )?;
        let mut written = 0;
        for (garment, sizes) in overrides {
            for (size, allocatable) in sizes {
                written += stmt.execute(params![garment.as_str(), size, allocatable])?;
            }
        }
        Ok(written)
    }

    pub fn load_overrides(&self) -> RepositoryResult<ManualOverrides> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT garment_type, size_label, allocatable FROM manual_override ORDER BY garment_type, size_label",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut overrides = ManualOverrides::new();
        for (garment, size, allocatable) in rows {
            overrides
                .entry(parse_garment(&garment)?)
                .or_default()
                .insert(size, allocatable);
        }
        Ok(overrides)
    }
}
