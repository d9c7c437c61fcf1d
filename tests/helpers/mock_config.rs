// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use uniform_allocation::config::{
    AllocationConfig, AllocationConfigReader, ConfigResult, PantsRuleSet, ShirtRuleSet,
};
use uniform_allocation::domain::{GarmentType, ReservationPolicy, SizeLadder};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub inner: AllocationConfig,
    /// 为 true 时读取尺码序列失败
    pub fail_ladder: bool,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            inner: AllocationConfig::default(),
            fail_ladder: false,
        }
    }

    /// 自定义尺码序列
    pub fn with_ladder(labels: &[&str]) -> Self {
        let mut config = Self::default();
        config.inner.size_ladder = SizeLadder::from_labels(labels).expect("测试尺码序列无效");
        config
    }

    /// 设置某类别的预留策略
    pub fn policy(mut self, garment: GarmentType, policy: ReservationPolicy) -> Self {
        self.inner.reservation_policies.insert(garment, policy);
        self
    }

    /// 配置读取失败
    pub fn broken() -> Self {
        let mut config = Self::default();
        config.fail_ladder = true;
        config
    }
}

#[async_trait]
impl AllocationConfigReader for MockConfig {
    async fn get_size_ladder(&self) -> ConfigResult<SizeLadder> {
        if self.fail_ladder {
            return Err("mock: size ladder unavailable".into());
        }
        Ok(self.inner.size_ladder.clone())
    }

    async fn get_reservation_policy(
        &self,
        garment: GarmentType,
    ) -> ConfigResult<ReservationPolicy> {
        Ok(self.inner.reservation_policy(garment))
    }

    async fn get_shirt_rules(&self) -> ConfigResult<ShirtRuleSet> {
        Ok(self.inner.shirt_rules.clone())
    }

    async fn get_pants_rules(&self) -> ConfigResult<PantsRuleSet> {
        Ok(self.inner.pants_rules)
    }

    async fn get_deficiency_threshold(&self, garment: GarmentType) -> ConfigResult<f64> {
        Ok(self.inner.deficiency_threshold(garment))
    }

    async fn get_yield_every(&self) -> ConfigResult<usize> {
        Ok(self.inner.yield_every)
    }
}
