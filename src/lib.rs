// ==========================================
// 校服尺码分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按测量数据为学生分配四类校服尺码,并按策略预留库存
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 规则表与配置读取
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 引擎层 - 预留与分配
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// API 层 - 业务接口
pub mod api;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AdjustmentMark, FailureReason, GarmentType, Gender};

// 领域实体
pub use domain::{
    AllocationStatistics, InventoryCell, InventorySnapshot, ManualOverrides, ReservationPolicy,
    SizeLadder, StudentRecord,
};

// 配置
pub use config::{AllocationConfig, AllocationConfigReader, ConfigManager};

// 引擎
pub use engine::{
    AllocationEngine, AllocationInput, AllocationOutcome, CategoryOutcome, InventoryLedger,
};

// API
pub use api::{AllocationApi, ApiError, ApiResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "校服尺码分配系统";
