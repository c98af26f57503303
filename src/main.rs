// ==========================================
// 会员组织管理系统 - 命令行入口
// ==========================================
// 子命令:
// - import <FILE>   导入 EXCO 职务 CSV
// - init-db         初始化数据库表结构
// - batches         查看最近的导入批次
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use membership_registry::api::{ApiError, ImportApi, ImportApiResponse};
use membership_registry::db::{ensure_schema, get_default_db_path, open_sqlite_connection};
use membership_registry::importer::ImportOptions;
use membership_registry::logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "membership-registry",
    version,
    about = "会员组织管理系统 - EXCO 职务批量导入"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 数据库路径（默认: $MEMBERSHIP_REGISTRY_DB_PATH 或用户数据目录）
    #[arg(long = "db", value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long = "log-json", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// 导入 EXCO 职务 CSV
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 仅校验，不写库
        #[arg(long = "validate-only")]
        validate_only: bool,

        /// 对仅会员行（部门为空）也校验会员是否存在
        #[arg(long = "strict-member-rows")]
        strict_member_rows: bool,

        /// 操作人
        #[arg(long = "by", value_name = "NAME")]
        imported_by: Option<String>,

        /// 以 JSON 输出导入结果
        #[arg(long = "json")]
        json: bool,
    },

    /// 初始化数据库表结构（幂等）
    InitDb,

    /// 查看最近的导入批次
    Batches {
        #[arg(long = "limit", default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::info!(version = membership_registry::VERSION, db_path = %db_path, "{}", membership_registry::APP_NAME);

    match run(cli.command, db_path).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, db_path: String) -> anyhow::Result<ExitCode> {
    match command {
        Command::Import {
            file,
            validate_only,
            strict_member_rows,
            imported_by,
            json,
        } => {
            let options = ImportOptions {
                validate_only,
                strict_member_rows: strict_member_rows.then_some(true),
                imported_by,
                source_name: None,
            };
            let api = ImportApi::new(db_path);
            match api
                .import_exco_file(&file.to_string_lossy(), &options)
                .await
            {
                Ok(response) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        print_summary(&response);
                    }
                    Ok(if response.failed_imports > 0 {
                        ExitCode::from(1)
                    } else {
                        ExitCode::SUCCESS
                    })
                }
                Err(ApiError::ImportRejected { reason, errors }) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&errors)?);
                    }
                    eprintln!("文件被拒收: {}", reason);
                    for err in errors.iter().filter(|e| !e.is_error()) {
                        eprintln!("  警告: {}", err.detailed_message);
                    }
                    Ok(ExitCode::from(2))
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::InitDb => {
            let conn = open_sqlite_connection(&db_path)
                .with_context(|| format!("无法打开数据库: {}", db_path))?;
            ensure_schema(&conn).context("建表失败")?;
            println!("数据库已初始化: {}", db_path);
            Ok(ExitCode::SUCCESS)
        }
        Command::Batches { limit } => {
            let api = ImportApi::new(db_path);
            for batch in api.list_import_batches(limit).await? {
                println!(
                    "{}  {}  {}  总计={} 成功={} 失败={} 跳过={}",
                    batch.imported_at.format("%Y-%m-%d %H:%M:%S"),
                    batch.batch_id,
                    batch.file_name.as_deref().unwrap_or("-"),
                    batch.total_rows,
                    batch.success_rows,
                    batch.failed_rows,
                    batch.skipped_rows
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_summary(response: &ImportApiResponse) {
    println!("批次: {} ({})", response.batch_id, response.state);
    println!(
        "总计 {} 行: 成功 {}，失败 {}，跳过 {}，警告 {}，耗时 {} ms",
        response.total_records,
        response.successful_imports,
        response.failed_imports,
        response.skipped_records,
        response.warning_count,
        response.processing_time_ms
    );
    for (error_type, count) in &response.errors_by_type {
        println!("  {:<32} {}", error_type, count);
    }
    for err in &response.errors {
        if err.row_number > 0 {
            println!("  [{}] 第 {} 行 {}: {}", err.severity, err.row_number, err.error_type, err.detailed_message);
        } else {
            println!("  [{}] {}: {}", err.severity, err.error_type, err.detailed_message);
        }
    }
    if response.errors_truncated {
        println!("  ……（错误明细已截断，按类型汇总见上）");
    }
}
