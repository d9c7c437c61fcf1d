// ==========================================
// 校服尺码分配系统 - API 层
// ==========================================
// 职责: 串联仓储、配置与引擎,供命令行入口调用
// ==========================================

pub mod allocation_api;
pub mod error;

// 重导出核心类型
pub use allocation_api::AllocationApi;
pub use error::{ApiError, ApiResult};
