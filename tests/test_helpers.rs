// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、API 实例
// ==========================================

use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use uniform_allocation::db::{init_schema, open_sqlite_connection};
use uniform_allocation::AllocationApi;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是有效 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建基于临时数据库的 AllocationApi
pub fn create_test_api() -> Result<(NamedTempFile, AllocationApi), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let api = AllocationApi::new(&db_path)?;
    Ok((temp_file, api))
}

/// 创建 AllocationApi 并返回其共享连接（用于在测试中直接改动表结构）
pub fn create_test_api_with_conn(
) -> Result<(NamedTempFile, Arc<Mutex<Connection>>, AllocationApi), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
    let api = AllocationApi::from_connection(conn.clone())?;
    Ok((temp_file, conn, api))
}
