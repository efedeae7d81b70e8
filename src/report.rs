//! 一覧表示モジュール

use crate::store::{Project, Task};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// 表示用の時刻書式
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 実行中タスクの表示マーカー
pub const RUNNING_MARKER: &str = "*";

/// プロジェクト一覧を表形式に整形
pub fn render_projects(projects: &[Project]) -> Vec<String> {
    let mut lines = vec![format!("{:>10}|{:15}", "ID", "Name")];
    for project in projects {
        lines.push(format!("{:>10}|{:15}", project.id, project.name));
    }
    lines
}

/// タスク一覧を表形式に整形
pub fn render_tasks(tasks: &[Task]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:8}|{:15}|{:50}|{:20}|{:20}|{:10}|{:8}",
        "Task Id", "Project Name", "Task Name", "Start Time", "Stop Time", "Total Mins", "Is Running"
    )];

    for task in tasks {
        let stop_time = task.stop_time.map(format_local_time).unwrap_or_default();
        lines.push(format!(
            "{:8}|{:15}|{:50}|{:20}|{:20}|{:10}|{:8}",
            task.id,
            task.project_name,
            task.name,
            format_local_time(task.start_time),
            stop_time,
            task.total_mins,
            running_marker(task.is_running)
        ));
    }

    lines
}

/// 実行中タスクを1行で表示
pub fn describe_running(task: &Task) -> String {
    format!(
        "{}/{} ({}から {})",
        task.project_name,
        task.name,
        format_local_time(task.start_time),
        format_minutes(task.total_mins)
    )
}

/// UTC時刻をローカル時刻で表示
pub fn format_local_time(t: DateTime<Utc>) -> String {
    format_in(t, &Local)
}

fn format_in<Tz: TimeZone>(t: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    t.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

fn running_marker(is_running: bool) -> &'static str {
    if is_running {
        RUNNING_MARKER
    } else {
        ""
    }
}

/// 分を「○時間○分」形式にフォーマット
pub fn format_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 {
        format!("{}時間{}分", hours, mins)
    } else {
        format!("{}分", mins)
    }
}
