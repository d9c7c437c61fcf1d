// ==========================================
// 校服尺码分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope),复杂配置以 JSON 存储
// 口径: 配置缺失或格式错误时回退默认值并告警,不阻断分配
// ==========================================

use crate::config::allocation_config::{
    default_deficiency_threshold, AllocationConfig, PantsRuleSet, ShirtRuleSet,
};
use crate::config::config_reader::{AllocationConfigReader, ConfigResult};
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::reservation::ReservationPolicy;
use crate::domain::size_ladder::SizeLadder;
use crate::domain::types::GarmentType;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
            init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法,供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 JSON 配置;缺失返回 None,格式错误告警后返回 None
    fn get_json_config<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<Option<T>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    error = %e,
                    "配置格式错误，使用默认值"
                );
                Ok(None)
            }
        }
    }

    /// 整体写入分配配置（学校初始化/运维界面使用）
    pub fn save_allocation_config(&self, config: &AllocationConfig) -> ConfigResult<()> {
        self.set_global_config_value(
            config_keys::SIZE_LADDER,
            &serde_json::to_string(&config.size_ladder)?,
        )?;
        for garment in GarmentType::ALL {
            self.set_global_config_value(
                &config_keys::reservation_policy(garment),
                &serde_json::to_string(&config.reservation_policy(garment))?,
            )?;
            self.set_global_config_value(
                &config_keys::deficiency_threshold(garment),
                &config.deficiency_threshold(garment).to_string(),
            )?;
        }
        self.set_global_config_value(
            config_keys::SHIRT_RULES,
            &serde_json::to_string(&config.shirt_rules)?,
        )?;
        self.set_global_config_value(
            config_keys::PANTS_RULES,
            &serde_json::to_string(&config.pants_rules)?,
        )?;
        self.set_global_config_value(config_keys::YIELD_EVERY, &config.yield_every.to_string())?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 在分配运行时记录配置快照,保证结果可复现
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会整体替换现有的 global 配置（快照中没有的键被删除）
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM config_kv WHERE scope_id = 'global'", [])?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_size_ladder(&self) -> ConfigResult<SizeLadder> {
        Ok(self
            .get_json_config::<SizeLadder>(config_keys::SIZE_LADDER)?
            .unwrap_or_default())
    }

    async fn get_reservation_policy(
        &self,
        garment: GarmentType,
    ) -> ConfigResult<ReservationPolicy> {
        Ok(self
            .get_json_config::<ReservationPolicy>(&config_keys::reservation_policy(garment))?
            .unwrap_or_default())
    }

    async fn get_shirt_rules(&self) -> ConfigResult<ShirtRuleSet> {
        Ok(self
            .get_json_config::<ShirtRuleSet>(config_keys::SHIRT_RULES)?
            .unwrap_or_default())
    }

    async fn get_pants_rules(&self) -> ConfigResult<PantsRuleSet> {
        Ok(self
            .get_json_config::<PantsRuleSet>(config_keys::PANTS_RULES)?
            .unwrap_or_default())
    }

    async fn get_deficiency_threshold(&self, garment: GarmentType) -> ConfigResult<f64> {
        let default = default_deficiency_threshold(garment);
        let value = self.get_config_value(&config_keys::deficiency_threshold(garment))?;
        Ok(value
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default))
    }

    async fn get_yield_every(&self) -> ConfigResult<usize> {
        let value = self.get_config_value(config_keys::YIELD_EVERY)?;
        Ok(value
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(200))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::GarmentType;

    // 尺码序列 (JSON 标签数组)
    pub const SIZE_LADDER: &str = "size_ladder";

    // 规则表 (JSON)
    pub const SHIRT_RULES: &str = "shirt_rules";
    pub const PANTS_RULES: &str = "pants_rules";

    // 执行
    pub const YIELD_EVERY: &str = "yield_every";

    /// 预留策略 (JSON),按类别
    pub fn reservation_policy(garment: GarmentType) -> String {
        format!("reservation_policy/{}", garment.as_str())
    }

    /// 裤长提示阈值,按类别
    pub fn deficiency_threshold(garment: GarmentType) -> String {
        format!("deficiency_threshold/{}", garment.as_str())
    }
}
