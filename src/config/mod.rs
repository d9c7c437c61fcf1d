// ==========================================
// 校服尺码分配系统 - 配置层
// ==========================================
// 职责: 分配配置与规则表定义、读取接口、config_kv 持久化
// 存储: config_kv 表
// ==========================================

pub mod allocation_config;
pub mod config_manager;
pub mod config_reader;

// 重导出核心配置
pub use allocation_config::{
    AllocationConfig, DowngradeRule, PantsRuleSet, Parity, ShirtOffsetRule, ShirtRuleSet,
};
pub use config_manager::{config_keys, ConfigManager};
pub use config_reader::{AllocationConfigReader, ConfigResult};
