// ==========================================
// 校服尺码分配系统 - 学生名册仓储
// ==========================================
// 表: student_roster（每名学生一行 JSON,seq_no 保留导入顺序）
// ==========================================

use crate::domain::student::StudentRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Transaction};
use std::sync::{Arc, Mutex};

pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换名册（含分配结果）
    ///
    /// # 返回
    /// - Ok(usize): 写入人数
    /// - Err(UniqueConstraintViolation): 学生 ID 重复
    pub fn save_all(&self, students: &[StudentRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let count = Self::save_all_tx(&tx, students)?;

        tx.commit()?;
        Ok(count)
    }

    /// 在调用方事务内整体替换名册（不提交）
    pub(crate) fn save_all_tx(
        tx: &Transaction,
        students: &[StudentRecord],
    ) -> RepositoryResult<usize> {
        tx.execute("DELETE FROM student_roster", [])?;

        let mut stmt = tx.prepare(
            "INSERT INTO student_roster (student_id, seq_no, record_json) VALUES (?1, ?2, ?3)",
        )?;
        for (seq_no, student) in students.iter().enumerate() {
            let json = serde_json::to_string(student)?;
            stmt.execute(params![student.id, seq_no as i64, json])?;
        }
        Ok(students.len())
    }

    /// 按导入顺序读取全部学生
    pub fn load_all(&self) -> RepositoryResult<Vec<StudentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT record_json FROM student_roster ORDER BY seq_no")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<String>>>()?;

        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(RepositoryError::from))
            .collect()
    }

    pub fn find_by_id(&self, student_id: &str) -> RepositoryResult<Option<StudentRecord>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM student_roster WHERE student_id = ?1",
                params![student_id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(RepositoryError::from))
            .transpose()
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM student_roster", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::types::Gender;

    fn repo() -> StudentRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        StudentRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_roster_keeps_order() {
        let repo = repo();
        let mut b = StudentRecord::new("B002", Gender::Female);
        b.chest = Some(31.0);
        let a = StudentRecord::new("A001", Gender::Male);

        repo.save_all(&[b.clone(), a.clone()]).unwrap();

        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded, vec![b.clone(), a]);
        assert_eq!(repo.find_by_id("B002").unwrap(), Some(b));
        assert_eq!(repo.find_by_id("nope").unwrap(), None);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let repo = repo();
        let s = StudentRecord::new("DUP", Gender::Male);
        let result = repo.save_all(&[s.clone(), s]);
        assert!(matches!(
            result,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
    }
}
