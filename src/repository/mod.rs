// ==========================================
// 校服尺码分配系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod allocation_input_repo;
pub mod allocation_run_repo;
pub mod error;
pub mod inventory_repo;
pub mod student_repo;

// 重导出核心仓储
pub use allocation_input_repo::{AllocationInputRepository, InputWriteSummary};
pub use allocation_run_repo::{AllocationRunRepository, AllocationRunSummary};
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryRepository;
pub use student_repo::StudentRepository;
