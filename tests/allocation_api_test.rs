// ==========================================
// AllocationApi 集成测试
// ==========================================
// 测试范围:
// 1. 输入导入与读取
// 2. 分配运行: 结果写回名册与库存、运行记录保存
// 3. 人工覆写: 设置、清除、对下一次运行生效
// 4. 配置: 数据库中的配置驱动引擎、按运行快照恢复配置
// 5. 落库原子性: 写入失败时名册与库存保持原状
// ==========================================

mod helpers;
mod test_helpers;

use helpers::test_data_builder::{InventoryBuilder, StudentBuilder};
use test_helpers::{create_test_api, create_test_api_with_conn};
use uniform_allocation::repository::{InventoryRepository, StudentRepository};
use uniform_allocation::config::AllocationConfig;
use uniform_allocation::domain::{GarmentType, ReservationPolicy, SizeLadder};
use uniform_allocation::engine::AllocationInput;
use uniform_allocation::{logging, ApiError};

fn sample_input() -> AllocationInput {
    AllocationInput {
        students: vec![
            StudentBuilder::male("S001")
                .class("初一(1)班", "1")
                .measured(30.0, 28.0, 33.0)
                .needs(GarmentType::ShortShirt, 1)
                .needs(GarmentType::LongPants, 1)
                .build(),
            StudentBuilder::female("S002")
                .class("初一(1)班", "2")
                .measured(32.0, 27.0, 35.0)
                .needs(GarmentType::ShortShirt, 1)
                .build(),
        ],
        inventory: InventoryBuilder::new()
            .stock(GarmentType::ShortShirt, "L/40", 1)
            .stock(GarmentType::ShortShirt, "XL/42", 4)
            .stock(GarmentType::LongPants, "L/40", 2)
            .build(),
        ..AllocationInput::default()
    }
}

// ==========================================
// 输入导入
// ==========================================

#[test]
fn test_import_and_load_input() {
    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    let input = sample_input();

    api.import_input(&input).expect("导入失败");

    let loaded = api.load_input().expect("读取失败");
    assert_eq!(loaded, input);
}

#[test]
fn test_import_rejects_duplicate_student_id() {
    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    let mut input = sample_input();
    input.students[1].id = "S001".to_string();

    let result = api.import_input(&input);
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

// ==========================================
// 分配运行
// ==========================================

#[tokio::test]
async fn test_run_persists_results_and_run_record() {
    logging::init_test();

    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    api.import_input(&sample_input()).expect("导入失败");

    let outcome = api.run_allocation().await.expect("分配失败");

    // 男 30 偶数 → 40 → L/40;女 32 偶数 → 40 → L/40 已被领走 → 备选 42 → XL/42↑
    let s1 = &outcome.students[0];
    assert_eq!(s1.assignment(GarmentType::ShortShirt).size.as_deref(), Some("L/40"));
    let s2 = &outcome.students[1];
    assert_eq!(s2.assignment(GarmentType::ShortShirt).size.as_deref(), Some("XL/42"));
    assert_eq!(
        s2.assignment(GarmentType::ShortShirt).display_size(),
        "XL/42↑"
    );

    // 28 × 1.2 = 33.6 → 可用尺码 L/40
    assert_eq!(s1.assignment(GarmentType::LongPants).size.as_deref(), Some("L/40"));

    let stored = api.load_input().expect("读取失败");
    assert_eq!(stored.students, outcome.students);
    assert_eq!(stored.inventory, outcome.inventory);

    let latest = api.latest_run().expect("查询失败").expect("应有运行记录");
    assert_eq!(latest.run_id, outcome.run_id);
    assert_eq!(api.get_run(&outcome.run_id).expect("查询失败").run_id, outcome.run_id);

    let runs = api.list_runs(5).expect("查询失败");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].student_count, 2);
    assert_eq!(runs[0].failed_count, 0);
}

#[tokio::test]
async fn test_get_unknown_run_is_not_found() {
    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    assert!(api.latest_run().expect("查询失败").is_none());
    assert!(matches!(api.get_run("nope"), Err(ApiError::NotFound(_))));
}

// ==========================================
// 人工覆写
// ==========================================

#[tokio::test]
async fn test_manual_override_applies_to_next_run() {
    logging::init_test();

    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    api.import_input(&sample_input()).expect("导入失败");

    api.set_manual_override(GarmentType::ShortShirt, "XL/42", 0)
        .await
        .expect("设置覆写失败");

    let outcome = api.run_allocation().await.expect("分配失败");
    let cell = outcome.inventory[&GarmentType::ShortShirt]["XL/42"];
    assert_eq!(cell.allocatable, 0);
    assert_eq!(cell.reserved, 4);
    // XL/42 被冻结后女生无尺码可用
    assert!(outcome.students[1]
        .assignment(GarmentType::ShortShirt)
        .is_failed());

    api.clear_manual_override(GarmentType::ShortShirt, "XL/42")
        .expect("清除覆写失败");
    let rerun = api.run_allocation().await.expect("分配失败");
    assert_eq!(
        rerun.students[1].assignment(GarmentType::ShortShirt).size.as_deref(),
        Some("XL/42")
    );
}

#[tokio::test]
async fn test_manual_override_validation() {
    let (_tmp, api) = create_test_api().expect("无法创建测试环境");

    let result = api
        .set_manual_override(GarmentType::LongShirt, "XXL", 3)
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = api.clear_manual_override(GarmentType::LongShirt, "L/40");
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

// ==========================================
// 配置驱动
// ==========================================

#[tokio::test]
async fn test_stored_config_drives_engine() {
    let (_tmp, api) = create_test_api().expect("无法创建测试环境");

    let mut config = AllocationConfig::default();
    config.size_ladder = SizeLadder::from_labels(&["S/36", "M/38", "L/40", "XL/42"])
        .expect("尺码序列无效");
    config
        .reservation_policies
        .insert(GarmentType::ShortShirt, ReservationPolicy::Fixed { ratio: 0.5 });
    api.config_manager()
        .save_allocation_config(&config)
        .expect("保存配置失败");

    api.import_input(&sample_input()).expect("导入失败");
    let outcome = api.run_allocation().await.expect("分配失败");

    let shirts = &outcome.inventory[&GarmentType::ShortShirt];
    assert_eq!(shirts["XL/42"].reserved, 2);
    assert_eq!(shirts["L/40"].reserved, 1);
    assert_eq!(shirts["L/40"].allocatable, 0);
}

#[tokio::test]
async fn test_restore_run_config_reproduces_run() {
    logging::init_test();

    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    let mut config = AllocationConfig::default();
    config
        .reservation_policies
        .insert(GarmentType::ShortShirt, ReservationPolicy::Fixed { ratio: 0.5 });
    api.config_manager()
        .save_allocation_config(&config)
        .expect("保存配置失败");
    api.import_input(&sample_input()).expect("导入失败");

    let first = api.run_allocation().await.expect("分配失败");
    assert_eq!(first.inventory[&GarmentType::ShortShirt]["XL/42"].reserved, 2);

    api.config_manager()
        .save_allocation_config(&AllocationConfig::default())
        .expect("保存配置失败");
    let second = api.run_allocation().await.expect("分配失败");
    assert_eq!(second.inventory[&GarmentType::ShortShirt]["XL/42"].reserved, 0);

    let restored = api.restore_run_config(&first.run_id).expect("恢复配置失败");
    assert!(restored > 0);
    assert_eq!(
        api.run_config_snapshot(&first.run_id).expect("读取快照失败"),
        api.config_manager().get_config_snapshot().expect("读取快照失败")
    );

    let third = api.run_allocation().await.expect("分配失败");
    assert_eq!(third.inventory, first.inventory);
    assert_eq!(third.students, first.students);
}

#[test]
fn test_unknown_run_has_no_config_snapshot() {
    let (_tmp, api) = create_test_api().expect("无法创建测试环境");
    assert!(matches!(api.run_config_snapshot("nope"), Err(ApiError::NotFound(_))));
    assert!(matches!(api.restore_run_config("nope"), Err(ApiError::NotFound(_))));
}

// ==========================================
// 落库原子性
// ==========================================

#[tokio::test]
async fn test_failed_run_record_keeps_roster_and_inventory() {
    let (_tmp, conn, api) = create_test_api_with_conn().expect("无法创建测试环境");
    api.import_input(&sample_input()).expect("导入失败");
    let before = api.load_input().expect("读取失败");

    conn.lock()
        .expect("锁获取失败")
        .execute_batch("DROP TABLE allocation_run")
        .expect("删表失败");

    let result = api.run_allocation().await;
    assert!(matches!(result, Err(ApiError::DatabaseError(_))));

    // 未写入任何分配结果
    let after = api.load_input().expect("读取失败");
    assert_eq!(after, before);
    assert!(after
        .students
        .iter()
        .all(|s| s.assignment(GarmentType::ShortShirt).size.is_none()));
}

#[test]
fn test_failed_import_keeps_previous_input() {
    let (_tmp, conn, api) = create_test_api_with_conn().expect("无法创建测试环境");
    let original = sample_input();
    api.import_input(&original).expect("导入失败");

    conn.lock()
        .expect("锁获取失败")
        .execute_batch("DROP TABLE manual_override")
        .expect("删表失败");

    let replacement = AllocationInput {
        students: vec![StudentBuilder::male("S900").build()],
        inventory: InventoryBuilder::new()
            .stock(GarmentType::LongShirt, "M/38", 9)
            .build(),
        ..AllocationInput::default()
    };
    assert!(api.import_input(&replacement).is_err());

    let students = StudentRepository::from_connection(conn.clone())
        .load_all()
        .expect("读取名册失败");
    assert_eq!(students, original.students);
    let inventory = InventoryRepository::from_connection(conn)
        .load_snapshot()
        .expect("读取库存失败");
    assert_eq!(inventory, original.inventory);
}
