// ==========================================
// 校服尺码分配系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义分配引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::allocation_config::{AllocationConfig, PantsRuleSet, ShirtRuleSet};
use crate::domain::reservation::ReservationPolicy;
use crate::domain::size_ladder::SizeLadder;
use crate::domain::types::GarmentType;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 实现者: AllocationConfig（内存）、ConfigManager（config_kv 表）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    /// 获取尺码序列
    ///
    /// # 默认值
    /// - DEFAULT_LADDER_LABELS
    async fn get_size_ladder(&self) -> ConfigResult<SizeLadder>;

    /// 获取某类别的预留策略
    ///
    /// # 默认值
    /// - ReservationPolicy::None（不预留）
    async fn get_reservation_policy(
        &self,
        garment: GarmentType,
    ) -> ConfigResult<ReservationPolicy>;

    /// 获取上衣规则表
    async fn get_shirt_rules(&self) -> ConfigResult<ShirtRuleSet>;

    /// 获取裤子规则
    async fn get_pants_rules(&self) -> ConfigResult<PantsRuleSet>;

    /// 获取裤长提示阈值
    ///
    /// # 默认值
    /// - 上衣/短袖裤 2,长袖裤 3
    async fn get_deficiency_threshold(&self, garment: GarmentType) -> ConfigResult<f64>;

    /// 获取让出执行权的间隔（学生数）
    async fn get_yield_every(&self) -> ConfigResult<usize>;

    /// 组装一次运行所用的完整配置
    async fn load_allocation_config(&self) -> ConfigResult<AllocationConfig> {
        let mut reservation_policies = BTreeMap::new();
        let mut deficiency_thresholds = BTreeMap::new();
        for garment in GarmentType::ALL {
            reservation_policies.insert(garment, self.get_reservation_policy(garment).await?);
            deficiency_thresholds.insert(garment, self.get_deficiency_threshold(garment).await?);
        }

        Ok(AllocationConfig {
            size_ladder: self.get_size_ladder().await?,
            reservation_policies,
            shirt_rules: self.get_shirt_rules().await?,
            pants_rules: self.get_pants_rules().await?,
            deficiency_thresholds,
            yield_every: self.get_yield_every().await?,
        })
    }
}

// ==========================================
// 内存配置实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for AllocationConfig {
    async fn get_size_ladder(&self) -> ConfigResult<SizeLadder> {
        Ok(self.size_ladder.clone())
    }

    async fn get_reservation_policy(
        &self,
        garment: GarmentType,
    ) -> ConfigResult<ReservationPolicy> {
        Ok(self.reservation_policy(garment))
    }

    async fn get_shirt_rules(&self) -> ConfigResult<ShirtRuleSet> {
        Ok(self.shirt_rules.clone())
    }

    async fn get_pants_rules(&self) -> ConfigResult<PantsRuleSet> {
        Ok(self.pants_rules)
    }

    async fn get_deficiency_threshold(&self, garment: GarmentType) -> ConfigResult<f64> {
        Ok(self.deficiency_threshold(garment))
    }

    async fn get_yield_every(&self) -> ConfigResult<usize> {
        Ok(self.yield_every)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_reader_roundtrip() {
        let mut config = AllocationConfig::default();
        config
            .reservation_policies
            .insert(GarmentType::LongPants, ReservationPolicy::Fixed { ratio: 0.05 });
        config.yield_every = 16;

        let loaded = config.load_allocation_config().await.unwrap();
        assert_eq!(loaded.reservation_policies.len(), 4);
        assert_eq!(
            loaded.reservation_policy(GarmentType::LongPants),
            ReservationPolicy::Fixed { ratio: 0.05 }
        );
        assert_eq!(loaded.size_ladder, config.size_ladder);
        assert_eq!(loaded.yield_every, 16);
    }
}
