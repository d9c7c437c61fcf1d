// ==========================================
// 配置持久化集成测试
// ==========================================
// 测试范围: ConfigManager 在文件数据库上的写入、重开读取与快照
// ==========================================

mod test_helpers;

use test_helpers::create_test_db;
use uniform_allocation::config::{
    config_keys, AllocationConfig, AllocationConfigReader, ConfigManager,
};
use uniform_allocation::domain::{GarmentType, ReservationPolicy};

#[tokio::test]
async fn test_config_survives_reopen() {
    let (_tmp, db_path) = create_test_db().expect("无法创建测试数据库");

    {
        let cm = ConfigManager::new(&db_path).expect("无法打开配置");
        let mut config = AllocationConfig::default();
        config
            .reservation_policies
            .insert(GarmentType::LongPants, ReservationPolicy::Fixed { ratio: 0.15 });
        config.deficiency_thresholds.insert(GarmentType::LongPants, 4.0);
        config.yield_every = 32;
        cm.save_allocation_config(&config).expect("保存失败");
    }

    let cm = ConfigManager::new(&db_path).expect("无法重新打开配置");
    let loaded = cm.load_allocation_config().await.expect("读取失败");

    assert_eq!(
        loaded.reservation_policy(GarmentType::LongPants),
        ReservationPolicy::Fixed { ratio: 0.15 }
    );
    assert_eq!(loaded.deficiency_threshold(GarmentType::LongPants), 4.0);
    assert_eq!(loaded.deficiency_threshold(GarmentType::ShortPants), 2.0);
    assert_eq!(loaded.yield_every, 32);
}

#[tokio::test]
async fn test_snapshot_restores_previous_policy() {
    let (_tmp, db_path) = create_test_db().expect("无法创建测试数据库");
    let cm = ConfigManager::new(&db_path).expect("无法打开配置");

    let key = config_keys::reservation_policy(GarmentType::ShortShirt);
    cm.set_global_config_value(&key, r#"{"mode":"fixed","ratio":0.2}"#)
        .expect("写入失败");
    let snapshot = cm.get_config_snapshot().expect("快照失败");

    cm.set_global_config_value(&key, r#"{"mode":"none"}"#)
        .expect("写入失败");
    assert_eq!(
        cm.get_reservation_policy(GarmentType::ShortShirt)
            .await
            .expect("读取失败"),
        ReservationPolicy::None
    );

    cm.restore_config_from_snapshot(&snapshot).expect("恢复失败");
    assert_eq!(
        cm.get_reservation_policy(GarmentType::ShortShirt)
            .await
            .expect("读取失败"),
        ReservationPolicy::Fixed { ratio: 0.2 }
    );
}
