// ==========================================
// 校服尺码分配系统 - 分配业务 API
// ==========================================
// 职责:
// 1. 导入已解析的学生名册与库存快照
// 2. 执行分配并持久化结果、运行记录与配置快照（单事务）
// 3. 人工覆写设置/清除
// 4. 运行记录查询与按运行恢复配置
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{AllocationConfigReader, ConfigManager};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::types::GarmentType;
use crate::engine::{AllocationEngine, AllocationInput, AllocationOutcome};
use crate::repository::{
    AllocationInputRepository, AllocationRunRepository, AllocationRunSummary,
    InventoryRepository, StudentRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

// ==========================================
// AllocationApi - 分配业务 API
// ==========================================
pub struct AllocationApi {
    config_manager: Arc<ConfigManager>,
    input_repo: AllocationInputRepository,
    student_repo: StudentRepository,
    inventory_repo: InventoryRepository,
    run_repo: AllocationRunRepository,
    engine: AllocationEngine<ConfigManager>,
}

impl AllocationApi {
    /// 打开数据库并创建 API 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（仓储与配置共享同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| ApiError::ConfigError(e.to_string()))?,
        );

        Ok(Self {
            input_repo: AllocationInputRepository::from_connection(conn.clone()),
            student_repo: StudentRepository::from_connection(conn.clone()),
            inventory_repo: InventoryRepository::from_connection(conn.clone()),
            run_repo: AllocationRunRepository::from_connection(conn),
            engine: AllocationEngine::new(config_manager.clone()),
            config_manager,
        })
    }

    pub fn config_manager(&self) -> Arc<ConfigManager> {
        self.config_manager.clone()
    }

    // ==========================================
    // 输入
    // ==========================================

    /// 保存分配输入（整体替换名册、库存与人工覆写）
    #[instrument(skip(self, input), fields(students = input.students.len()))]
    pub fn import_input(&self, input: &AllocationInput) -> ApiResult<()> {
        let mut seen = std::collections::HashSet::new();
        for student in &input.students {
            if student.id.trim().is_empty() {
                return Err(ApiError::InvalidInput("学生 ID 不能为空".to_string()));
            }
            if !seen.insert(student.id.as_str()) {
                return Err(ApiError::InvalidInput(format!(
                    "学生 ID 重复: {}",
                    student.id
                )));
            }
        }

        let written = self.input_repo.save_input(input)?;

        info!(
            students = written.students,
            cells = written.inventory_cells,
            overrides = written.overrides,
            "分配输入已保存"
        );
        Ok(())
    }

    /// 读取当前分配输入
    pub fn load_input(&self) -> ApiResult<AllocationInput> {
        Ok(AllocationInput {
            students: self.student_repo.load_all()?,
            inventory: self.inventory_repo.load_snapshot()?,
            manual_overrides: self.inventory_repo.load_overrides()?,
        })
    }

    // ==========================================
    // 运行
    // ==========================================

    /// 使用已保存的输入执行分配,并写回学生结果、库存快照与运行记录
    ///
    /// 运行记录附带本次使用的配置快照;落库失败时名册与库存保持运行前状态
    #[instrument(skip(self))]
    pub async fn run_allocation(&self) -> ApiResult<AllocationOutcome> {
        let config_snapshot = self
            .config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let input = self.load_input()?;
        let outcome = self.engine.run(input).await?;

        self.run_repo.persist_run(&outcome, Some(&config_snapshot))?;

        info!(
            run_id = %outcome.run_id,
            failed = outcome.failed_count(),
            "分配运行已保存"
        );
        Ok(outcome)
    }

    // ==========================================
    // 人工覆写
    // ==========================================

    /// 设置人工可分配量;尺码必须在当前尺码序列上
    pub async fn set_manual_override(
        &self,
        garment: GarmentType,
        size: &str,
        allocatable: u32,
    ) -> ApiResult<()> {
        let ladder = self
            .config_manager
            .get_size_ladder()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        if !ladder.contains(size) {
            return Err(ApiError::InvalidInput(format!(
                "尺码不在尺码序列上: {}",
                size
            )));
        }

        self.inventory_repo.set_override(garment, size, allocatable)?;
        info!(garment_type = %garment, size_label = size, allocatable, "人工覆写已设置");
        Ok(())
    }

    /// 清除人工覆写,恢复按策略计算
    pub fn clear_manual_override(&self, garment: GarmentType, size: &str) -> ApiResult<()> {
        if !self.inventory_repo.clear_override(garment, size)? {
            return Err(ApiError::NotFound(format!(
                "人工覆写不存在: {} {}",
                garment, size
            )));
        }
        info!(garment_type = %garment, size_label = size, "人工覆写已清除");
        Ok(())
    }

    // ==========================================
    // 运行记录
    // ==========================================

    pub fn latest_run(&self) -> ApiResult<Option<AllocationOutcome>> {
        Ok(self.run_repo.find_latest()?)
    }

    pub fn get_run(&self, run_id: &str) -> ApiResult<AllocationOutcome> {
        self.run_repo
            .find_by_id(run_id)?
            .ok_or_else(|| ApiError::NotFound(format!("分配运行(id={})不存在", run_id)))
    }

    pub fn list_runs(&self, limit: usize) -> ApiResult<Vec<AllocationRunSummary>> {
        Ok(self.run_repo.list_summaries(limit)?)
    }

    /// 某次运行使用的配置快照（JSON）
    pub fn run_config_snapshot(&self, run_id: &str) -> ApiResult<String> {
        self.run_repo.find_config_snapshot(run_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("分配运行(id={})未记录配置快照", run_id))
        })
    }

    /// 将全局配置恢复为某次运行时的配置,之后的运行可复现该次结果
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    #[instrument(skip(self))]
    pub fn restore_run_config(&self, run_id: &str) -> ApiResult<usize> {
        let snapshot = self.run_config_snapshot(run_id)?;
        let restored = self
            .config_manager
            .restore_config_from_snapshot(&snapshot)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        info!(run_id, restored, "配置已按运行快照恢复");
        Ok(restored)
    }
}
