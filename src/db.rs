// ==========================================
// 校服尺码分配系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供幂等建表（config_kv / 学生名册 / 库存 / 人工覆写 / 分配运行）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
/// - v1: 初始表结构
/// - v2: allocation_run 增加 config_snapshot_json
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS student_roster (
            student_id TEXT PRIMARY KEY,
            seq_no INTEGER NOT NULL,
            record_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS inventory_cell (
            garment_type TEXT NOT NULL,
            size_label TEXT NOT NULL,
            total INTEGER NOT NULL,
            reserved INTEGER NOT NULL DEFAULT 0,
            allocatable INTEGER NOT NULL DEFAULT 0,
            allocated INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (garment_type, size_label)
        );

        CREATE TABLE IF NOT EXISTS manual_override (
            garment_type TEXT NOT NULL,
            size_label TEXT NOT NULL,
            allocatable INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (garment_type, size_label)
        );

        CREATE TABLE IF NOT EXISTS allocation_run (
            run_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            student_count INTEGER NOT NULL,
            failed_count INTEGER NOT NULL,
            outcome_json TEXT NOT NULL,
            config_snapshot_json TEXT
        );
        "#,
    )?;

    // v1 → v2: 旧库补列
    if !table_has_column(conn, "allocation_run", "config_snapshot_json")? {
        conn.execute_batch("ALTER TABLE allocation_run ADD COLUMN config_snapshot_json TEXT;")?;
        tracing::info!("schema 迁移: allocation_run.config_snapshot_json 已添加");
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 检查表是否存在指定列
///
/// 表名来自内部常量,内联进 SQL;列名参数化
fn table_has_column(conn: &Connection, table: &str, col: &str) -> rusqlite::Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = ?1",
        table.replace('\'', "''")
    );
    let n: i64 = conn.query_row(&sql, [col], |row| row.get(0))?;
    Ok(n > 0)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径（用户数据目录下）
pub fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("uniform-allocation");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, dir = %dir.display(), "创建数据目录失败,回退到当前目录");
        return "uniform_allocation.db".to_string();
    }
    dir.join("uniform_allocation.db").to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        assert!(table_has_column(&conn, "allocation_run", "config_snapshot_json").unwrap());
    }

    #[test]
    fn test_v1_run_table_gains_snapshot_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            INSERT INTO schema_version (version) VALUES (1);
            CREATE TABLE allocation_run (
                run_id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                student_count INTEGER NOT NULL,
                failed_count INTEGER NOT NULL,
                outcome_json TEXT NOT NULL
            );
            INSERT INTO allocation_run VALUES ('r1', 't0', 't1', 0, 0, '{}');
            "#,
        )
        .unwrap();
        assert!(!table_has_column(&conn, "allocation_run", "config_snapshot_json").unwrap());

        init_schema(&conn).unwrap();

        assert!(table_has_column(&conn, "allocation_run", "config_snapshot_json").unwrap());
        assert_eq!(read_schema_version(&conn).unwrap(), Some(2));
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT config_snapshot_json FROM allocation_run WHERE run_id = 'r1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(snapshot, None);
    }
}
