//! タイムログストアモジュール
//!
//! プロジェクトとタスクをSQLiteファイルに永続化する。
//! 実行中のタスクはストア全体で高々1件。

use crate::error::StoreError;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// DBに保存するタイムスタンプの書式（UTC、秒精度）
///
/// 文字列比較がそのまま時刻順になる。
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// プロジェクトレコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// タスクレコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub project_name: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    /// 停止済みなら保存値、実行中なら参照時点までの経過分
    pub total_mins: i64,
    pub is_running: bool,
}

/// tasksテーブルの生の行
struct TaskRow {
    id: i64,
    project_id: i64,
    project_name: String,
    name: String,
    start_time: String,
    stop_time: Option<String>,
    total_mins: Option<i64>,
    is_running: bool,
}

impl TaskRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(TaskRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            project_name: row.get(2)?,
            name: row.get(3)?,
            start_time: row.get(4)?,
            stop_time: row.get(5)?,
            total_mins: row.get(6)?,
            is_running: row.get::<_, i32>(7)? != 0,
        })
    }

    fn into_task(self, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let start_time = parse_timestamp(&self.start_time)?;
        let stop_time = self.stop_time.as_deref().map(parse_timestamp).transpose()?;

        let total_mins = match self.total_mins {
            Some(mins) => mins,
            None => elapsed_minutes(start_time, now).max(0),
        };

        Ok(Task {
            id: self.id,
            project_id: self.project_id,
            project_name: self.project_name,
            name: self.name,
            start_time,
            stop_time,
            total_mins,
            is_running: self.is_running,
        })
    }
}

const TASK_SELECT: &str = r#"
    SELECT t.task_id, t.project_id, COALESCE(p.name, ''), t.name,
           t.start_time, t.stop_time, t.total_mins, t.is_running
    FROM tasks t
    LEFT JOIN projects p ON p.project_id = t.project_id
"#;

/// タイムログストア
pub struct TimeLogStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl TimeLogStore {
    /// ストアを開く（ディレクトリ・ファイルは必要に応じて作成）
    pub fn open(dir: &Path, filename: &str) -> Result<Self, StoreError> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let path = dir.join(filename);
        let conn = Connection::open(&path)?;

        // WALモードを有効化
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = TimeLogStore {
            conn,
            path: Some(path),
        };
        store.initialize_schema()?;

        debug!("ストアを開きました: {:?}", store.path);
        Ok(store)
    }

    /// インメモリのストアを開く
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = TimeLogStore {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// スキーマを初期化
    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                project_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS tasks (
                task_id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                start_time TEXT NOT NULL,
                stop_time TEXT,
                total_mins INTEGER,
                is_running INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project_id
            ON tasks(project_id);

            CREATE INDEX IF NOT EXISTS idx_tasks_is_running
            ON tasks(is_running);
            "#,
        )?;

        Ok(())
    }

    /// 接続を明示的に閉じる
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    /// プロジェクトを作成
    ///
    /// 同名のプロジェクトが既にあれば何もせず成功する。
    pub fn create_project(&mut self, name: &str) -> Result<String, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation(
                "プロジェクト名は空または空白のみにできません".to_string(),
            ));
        }

        debug!("プロジェクトを挿入: name={:?}", name);
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO projects (name) VALUES (?1)",
            params![name],
        )?;
        tx.commit()?;

        if inserted > 0 {
            info!("プロジェクトを作成しました: {}", name);
        } else {
            debug!("プロジェクトは既に存在します: {}", name);
        }

        Ok(name.to_string())
    }

    /// プロジェクトと配下のタスクをすべて削除
    pub fn remove_project(&mut self, name: &str) -> Result<String, StoreError> {
        let tx = self.conn.transaction()?;
        let project_id = find_project_id(&tx, name)?;

        debug!("プロジェクトとタスクを削除: project_id={}", project_id);
        tx.execute(
            "DELETE FROM projects WHERE project_id = ?1",
            params![project_id],
        )?;
        let removed_tasks = tx.execute(
            "DELETE FROM tasks WHERE project_id = ?1",
            params![project_id],
        )?;
        tx.commit()?;

        info!(
            "プロジェクトを削除しました: {}（タスク{}件）",
            name, removed_tasks
        );
        Ok(name.to_string())
    }

    /// プロジェクト一覧を作成順で取得
    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        debug!("プロジェクト一覧を検索");
        let mut stmt = self
            .conn
            .prepare("SELECT project_id, name FROM projects ORDER BY project_id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }

        Ok(projects)
    }

    /// 現在時刻でタスクを開始
    pub fn start_task(&mut self, project_name: &str, task_name: &str) -> Result<(), StoreError> {
        self.start_task_at(project_name, task_name, now())
    }

    /// 指定時刻でタスクを開始
    ///
    /// どのプロジェクトであれ実行中のタスクがあれば失敗する。
    pub fn start_task_at(
        &mut self,
        project_name: &str,
        task_name: &str,
        start_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let start_time = truncate_to_seconds(start_time);

        // チェックと挿入の間に他の書き込みが入らないよう即時ロックを取る
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(running) = query_running_task(&tx, start_time)? {
            return Err(StoreError::TaskAlreadyRunning {
                project: running.project_name,
                task: running.name,
            });
        }

        let project_id = find_project_id(&tx, project_name)?;

        debug!(
            "タスクを挿入: project_id={}, name={:?}, start_time={}",
            project_id,
            task_name,
            format_timestamp(start_time)
        );
        tx.execute(
            r#"
            INSERT INTO tasks (project_id, name, start_time, is_running)
            VALUES (?1, ?2, ?3, 1)
            "#,
            params![project_id, task_name, format_timestamp(start_time)],
        )?;
        tx.commit()?;

        info!("タスクを開始しました: {}/{}", project_name, task_name);
        Ok(())
    }

    /// 実行中のタスクを取得
    pub fn running_task(&self) -> Result<Option<Task>, StoreError> {
        query_running_task(&self.conn, now())
    }

    /// 現在時刻で実行中のタスクを停止
    pub fn stop_running_task(&mut self) -> Result<Option<Task>, StoreError> {
        self.stop_running_task_at(now())
    }

    /// 指定時刻で実行中のタスクを停止
    ///
    /// 実行中のタスクがなければ何もせずNoneを返す。
    pub fn stop_running_task_at(
        &mut self,
        stop_time: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let stop_time = truncate_to_seconds(stop_time);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(running) = query_running_task(&tx, stop_time)? else {
            debug!("実行中のタスクはありません");
            return Ok(None);
        };

        if stop_time < running.start_time {
            return Err(StoreError::Validation(format!(
                "停止時刻 {} が開始時刻 {} より前です",
                format_timestamp(stop_time),
                format_timestamp(running.start_time)
            )));
        }

        let total_mins = elapsed_minutes(running.start_time, stop_time);
        debug!(
            "タスクを更新: task_id={}, stop_time={}, total_mins={}",
            running.id,
            format_timestamp(stop_time),
            total_mins
        );

        tx.execute(
            r#"
            UPDATE tasks
            SET stop_time = ?1, total_mins = ?2, is_running = 0
            WHERE task_id = ?3 AND is_running = 1
            "#,
            params![format_timestamp(stop_time), total_mins, running.id],
        )?;
        tx.commit()?;

        info!(
            "タスクを停止しました: {}/{}（{}分）",
            running.project_name, running.name, total_mins
        );

        Ok(Some(Task {
            stop_time: Some(stop_time),
            total_mins,
            is_running: false,
            ..running
        }))
    }

    /// 直近`days`日分のプロジェクトのタスクを取得
    pub fn list_project_tasks(
        &self,
        project_name: &str,
        days: u32,
    ) -> Result<Vec<Task>, StoreError> {
        self.list_project_tasks_at(project_name, days, now())
    }

    /// 基準時刻`now`から直近`days`日分のタスクを取得
    ///
    /// 経過日数の切り捨てが`days`以下のタスクが対象。
    /// `days = 0`なら24時間以内に開始したタスクのみ。
    pub fn list_project_tasks_at(
        &self,
        project_name: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        let project_id = find_project_id(&self.conn, project_name)?;

        let now = truncate_to_seconds(now);
        let cutoff = format_timestamp(now - Duration::days(i64::from(days) + 1));

        let sql = format!(
            "{} WHERE t.project_id = ?1 AND t.start_time > ?2 ORDER BY t.task_id ASC",
            TASK_SELECT
        );
        debug!(
            "タスク一覧を検索: project_id={}, start_time > {}",
            project_id, cutoff
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![project_id, cutoff], TaskRow::from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task(now)?);
        }

        Ok(tasks)
    }
}

/// プロジェクト名からIDを引く
fn find_project_id(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    debug!("プロジェクトIDを検索: name={:?}", name);
    conn.query_row(
        "SELECT project_id FROM projects WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::ProjectNotFound(name.to_string()))
}

/// 実行中のタスクを1件取得
fn query_running_task(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<Option<Task>, StoreError> {
    let sql = format!(
        "{} WHERE t.is_running = 1 ORDER BY t.task_id ASC LIMIT 1",
        TASK_SELECT
    );
    debug!("実行中のタスクを検索");
    let row = conn.query_row(&sql, [], TaskRow::from_row).optional()?;

    row.map(|r| r.into_task(now)).transpose()
}

/// 現在時刻（UTC、秒精度）
fn now() -> DateTime<Utc> {
    truncate_to_seconds(Utc::now())
}

fn truncate_to_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0).unwrap_or(t)
}

/// 開始から終了までの経過分（端数切り捨て）
fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes()
}

fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| StoreError::InvalidTimestamp(format!("{}: {}", s, e)))
}
