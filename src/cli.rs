//! CLIモジュール

use crate::config::{CliArgs, Config};
use crate::report;
use crate::store::TimeLogStore;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// タスク名の最大文字数
pub const MAX_TASK_NAME_CHARS: usize = 50;

/// Timelog - プロジェクト単位のタイムトラッカー
#[derive(Parser, Debug)]
#[command(name = "timelog")]
#[command(about = "プロジェクト単位でタスクの作業時間を記録する", long_about = None)]
pub struct Cli {
    /// データディレクトリ
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// DBファイル名
    #[arg(long, global = true)]
    pub db_filename: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// サブコマンド
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// プロジェクト操作
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// タスク操作
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// バージョンを表示
    Version,
}

/// プロジェクトのサブコマンド
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// プロジェクトを作成（既存なら何もしない）
    Create { name: String },
    /// プロジェクトと配下の全タスクを削除
    Remove { name: String },
    /// プロジェクト一覧
    List,
}

/// タスクのサブコマンド
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// タスクを開始
    Start {
        project: String,
        /// タスク名（50文字まで）
        task: String,
    },
    /// 実行中のタスクを停止
    Stop,
    /// 実行中のタスクを表示
    Status,
    /// プロジェクトのタスク一覧
    List {
        /// 含める過去の日数（0なら今日のみ）
        #[arg(short, long, default_value_t = 0)]
        days: u32,

        project: String,
    },
}

/// CLIエントリポイント
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cli_args = CliArgs {
        data_dir: cli.data_dir,
        db_filename: cli.db_filename,
    };

    match cli.command {
        Commands::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Project { command } => {
            let mut store = open_store(&cli_args)?;
            run_project(&mut store, command)?;
            store.close()?;
        }
        Commands::Task { command } => {
            let mut store = open_store(&cli_args)?;
            run_task(&mut store, command)?;
            store.close()?;
        }
    }

    Ok(())
}

/// 設定を読み込んでストアを開く
fn open_store(cli_args: &CliArgs) -> Result<TimeLogStore> {
    let config = Config::load(cli_args)?;
    debug!("DBファイル: {}", config.db_path().display());

    Ok(TimeLogStore::open(&config.data_dir, &config.db_filename)?)
}

fn run_project(store: &mut TimeLogStore, command: ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::Create { name } => {
            let name = store.create_project(&name)?;
            println!("プロジェクト '{}' を作成しました", name);
        }
        ProjectCommands::Remove { name } => {
            let name = store.remove_project(&name)?;
            println!("プロジェクト '{}' を削除しました", name);
        }
        ProjectCommands::List => {
            for line in report::render_projects(&store.list_projects()?) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn run_task(store: &mut TimeLogStore, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::Start { project, task } => {
            let task = truncate_task_name(&task);
            store.start_task(&project, &task)?;
            println!("タスク '{}/{}' を開始しました", project, task);
        }
        TaskCommands::Stop => match store.stop_running_task()? {
            Some(task) => println!(
                "タスク '{}/{}' を停止しました（{}）",
                task.project_name,
                task.name,
                report::format_minutes(task.total_mins)
            ),
            None => println!("実行中のタスクはありません"),
        },
        TaskCommands::Status => match store.running_task()? {
            Some(task) => println!("{}", report::describe_running(&task)),
            None => println!("実行中のタスクはありません"),
        },
        TaskCommands::List { days, project } => {
            for line in report::render_tasks(&store.list_project_tasks(&project, days)?) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// タスク名を最大文字数に切り詰める
fn truncate_task_name(name: &str) -> String {
    name.chars().take(MAX_TASK_NAME_CHARS).collect()
}
