//! エラー型定義モジュール

use std::io;
use thiserror::Error;

/// 設定エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IOエラー: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML解析エラー: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("無効な設定値: {0}")]
    InvalidValue(String),
}

/// ストアエラー
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("プロジェクトが存在しません: {0}")]
    ProjectNotFound(String),

    #[error("既に実行中のタスクがあります: {project}/{task}")]
    TaskAlreadyRunning { project: String, task: String },

    #[error("SQLiteエラー: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] io::Error),

    #[error("不正なタイムスタンプ: {0}")]
    InvalidTimestamp(String),
}

impl StoreError {
    /// 利用者の操作に起因するエラーかどうか
    ///
    /// falseの場合はファイルやエンジン側の障害。
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_)
                | StoreError::ProjectNotFound(_)
                | StoreError::TaskAlreadyRunning { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue("db_filename".to_string());
        assert!(err.to_string().contains("無効な設定値"));
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::ProjectNotFound("acme".to_string());
        assert!(err.to_string().contains("acme"));
    }

    #[test]
    fn test_task_already_running_display() {
        let err = StoreError::TaskAlreadyRunning {
            project: "acme".to_string(),
            task: "design".to_string(),
        };
        assert!(err.to_string().contains("acme/design"));
    }

    #[test]
    fn test_domain_errors_are_distinguishable() {
        assert!(StoreError::Validation("empty".to_string()).is_domain_error());
        assert!(StoreError::ProjectNotFound("x".to_string()).is_domain_error());

        let io = StoreError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        assert!(!io.is_domain_error());
        assert!(!StoreError::InvalidTimestamp("bad".to_string()).is_domain_error());
    }

    #[test]
    fn test_sqlite_error_converts() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(!err.is_domain_error());
    }
}
