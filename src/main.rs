// ==========================================
// 校服尺码分配系统 - 命令行入口
// ==========================================
// 用法:
//   uniform-allocation [--db <path>] [--json-log] <command>
//
// 命令:
//   run <input.json>                     导入输入并执行分配,输出运行报告 JSON
//   rerun                                使用已保存的输入重新分配
//   latest                               输出最近一次运行报告
//   runs [limit]                         列出运行记录
//   override set <garment> <size> <n>    设置人工可分配量
//   override clear <garment> <size>      清除人工覆写
//   summary                              输出最近一次运行的文本摘要
//   config restore <run_id>              将配置恢复为某次运行时的配置
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use uniform_allocation::db::default_db_path;
use uniform_allocation::{logging, AllocationApi, AllocationInput, GarmentType};

struct CliArgs {
    db_path: String,
    json_log: bool,
    command: Vec<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut db_path = None;
    let mut json_log = false;
    let mut command = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                db_path = Some(args.next().ok_or_else(|| anyhow!("--db 缺少路径参数"))?);
            }
            "--json-log" => json_log = true,
            _ => command.push(arg),
        }
    }

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(default_db_path),
        json_log,
        command,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args()?;
    logging::init_cli(cli.json_log);

    tracing::info!(
        version = uniform_allocation::VERSION,
        db_path = %cli.db_path,
        "{} 启动",
        uniform_allocation::APP_NAME
    );

    let api = AllocationApi::new(&cli.db_path)
        .with_context(|| format!("无法打开数据库: {}", cli.db_path))?;

    let args: Vec<&str> = cli.command.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["run", input_path] => {
            let raw = std::fs::read_to_string(input_path)
                .with_context(|| format!("无法读取输入文件: {}", input_path))?;
            let input: AllocationInput =
                serde_json::from_str(&raw).context("输入文件不是有效的分配输入 JSON")?;
            api.import_input(&input)?;
            let outcome = api.run_allocation().await?;
            print_json(&outcome)?;
        }
        ["rerun"] => {
            let outcome = api.run_allocation().await?;
            print_json(&outcome)?;
        }
        ["latest"] => match api.latest_run()? {
            Some(outcome) => print_json(&outcome)?,
            None => bail!("尚无分配运行记录"),
        },
        ["summary"] => match api.latest_run()? {
            Some(outcome) => print!("{}", outcome.summary()),
            None => bail!("尚无分配运行记录"),
        },
        ["runs"] => print_json(&api.list_runs(20)?)?,
        ["runs", limit] => {
            let limit: usize = limit.parse().context("limit 必须为正整数")?;
            print_json(&api.list_runs(limit)?)?;
        }
        ["override", "set", garment, size, allocatable] => {
            let garment: GarmentType = garment.parse().map_err(|e: String| anyhow!(e))?;
            let allocatable: u32 = allocatable.parse().context("可分配量必须为非负整数")?;
            api.set_manual_override(garment, size, allocatable).await?;
        }
        ["override", "clear", garment, size] => {
            let garment: GarmentType = garment.parse().map_err(|e: String| anyhow!(e))?;
            api.clear_manual_override(garment, size)?;
        }
        ["config", "restore", run_id] => {
            let restored = api.restore_run_config(run_id)?;
            eprintln!("已恢复 {} 项配置", restored);
        }
        _ => bail!(
            "用法: uniform-allocation [--db <path>] [--json-log] \
             <run <input.json> | rerun | latest | summary | runs [limit] | \
             override set <garment> <size> <n> | override clear <garment> <size> | \
             config restore <run_id>>"
        ),
    }

    Ok(())
}
