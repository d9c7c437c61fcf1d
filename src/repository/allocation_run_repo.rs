// ==========================================
// 校服尺码分配系统 - 分配运行记录仓储
// ==========================================
// 表: allocation_run（运行摘要列 + 完整报告 JSON + 配置快照）
// 红线:
// - 运行记录只追加,不修改
// - 结果落库（名册、库存、运行记录）在同一事务内完成
// ==========================================

use crate::engine::AllocationOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::student_repo::StudentRepository;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 运行列表条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub student_count: u32,
    pub failed_count: u32,
}

pub struct AllocationRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRunRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存一次运行记录
    ///
    /// # 参数
    /// - config_snapshot_json: 运行时的配置快照（ConfigManager::get_config_snapshot）
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): run_id 已存在
    pub fn insert(
        &self,
        outcome: &AllocationOutcome,
        config_snapshot_json: Option<&str>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::insert_tx(&tx, outcome, config_snapshot_json)?;

        tx.commit()?;
        Ok(())
    }

    /// 保存运行结果: 写回名册与库存快照并追加运行记录（单事务）
    ///
    /// 任一写入失败时整体回滚,名册与库存保持运行前状态
    pub fn persist_run(
        &self,
        outcome: &AllocationOutcome,
        config_snapshot_json: Option<&str>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        StudentRepository::save_all_tx(&tx, &outcome.students)?;
        InventoryRepository::save_snapshot_tx(&tx, &outcome.inventory)?;
        Self::insert_tx(&tx, outcome, config_snapshot_json)?;

        tx.commit()?;
        Ok(())
    }

    fn insert_tx(
        tx: &Transaction,
        outcome: &AllocationOutcome,
        config_snapshot_json: Option<&str>,
    ) -> RepositoryResult<()> {
        let json = serde_json::to_string(outcome)?;
        tx.execute(
            r#"
            INSERT INTO allocation_run (
                run_id, started_at, finished_at, student_count, failed_count,
                outcome_json, config_snapshot_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                outcome.run_id,
                outcome.started_at,
                outcome.finished_at,
                outcome.students.len() as u32,
                outcome.failed_count(),
                json,
                config_snapshot_json,
            ],
        )?;
        Ok(())
    }

    /// 读取运行时的配置快照
    ///
    /// # 返回
    /// - Ok(None): 运行存在但未记录快照（旧版本数据）
    /// - Err(NotFound): 运行不存在
    pub fn find_config_snapshot(&self, run_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let row: Option<Option<String>> = conn
            .query_row(
                "SELECT config_snapshot_json FROM allocation_run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        row.ok_or_else(|| RepositoryError::NotFound {
            entity: "AllocationRun".to_string(),
            id: run_id.to_string(),
        })
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<AllocationOutcome>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT outcome_json FROM allocation_run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(RepositoryError::from))
            .transpose()
    }

    /// 最近一次运行（按结束时间）
    pub fn find_latest(&self) -> RepositoryResult<Option<AllocationOutcome>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT outcome_json FROM allocation_run ORDER BY finished_at DESC, rowid DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(RepositoryError::from))
            .transpose()
    }

    /// 运行列表（新 → 旧）
    pub fn list_summaries(&self, limit: usize) -> RepositoryResult<Vec<AllocationRunSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, started_at, finished_at, student_count, failed_count
            FROM allocation_run
            ORDER BY finished_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let summaries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AllocationRunSummary {
                    run_id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    student_count: row.get(3)?,
                    failed_count: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(summaries)
    }
}
