//! 設定モジュール

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// デフォルトのDBファイル名
pub const DEFAULT_DB_FILENAME: &str = "timelog.sqlite3";

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct Config {
    /// データディレクトリ
    pub data_dir: PathBuf,
    /// DBファイル名
    pub db_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_base_dir(),
            db_filename: DEFAULT_DB_FILENAME.to_string(),
        }
    }
}

/// TOML設定ファイル用構造体
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    data_dir: Option<String>,
    db_filename: Option<String>,
}

/// CLI引数
#[derive(Debug, Default)]
pub struct CliArgs {
    pub data_dir: Option<PathBuf>,
    pub db_filename: Option<String>,
}

impl Config {
    /// 設定を読み込む
    ///
    /// 優先順位: CLI引数 > 設定ファイル > デフォルト値
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path(), cli_args)
    }

    fn load_from(config_path: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let file_config: FileConfig = toml::from_str(&content)?;
            config.merge_file_config(&file_config);
        }

        config.merge_cli_args(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// ファイル設定をマージ
    fn merge_file_config(&mut self, file_config: &FileConfig) {
        if let Some(ref dir) = file_config.data_dir {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(ref filename) = file_config.db_filename {
            self.db_filename = filename.clone();
        }
    }

    /// CLI引数をマージ
    fn merge_cli_args(&mut self, cli_args: &CliArgs) {
        if let Some(ref dir) = cli_args.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(ref filename) = cli_args.db_filename {
            self.db_filename = filename.clone();
        }
    }

    /// 設定値をバリデート
    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_filename.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "db_filename must not be empty".to_string(),
            ));
        }
        if self.db_filename.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue(format!(
                "db_filename must not contain path separators: {}",
                self.db_filename
            )));
        }
        Ok(())
    }

    /// DBファイルのフルパス
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_filename)
    }
}

/// ~/.config/timelog
fn default_base_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("timelog")
}

/// 設定ファイルのパスを取得
fn config_file_path() -> PathBuf {
    default_base_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.db_filename, "timelog.sqlite3");
        assert!(config.data_dir.ends_with(".config/timelog"));
        assert!(config.db_path().ends_with("timelog.sqlite3"));
    }

    #[test]
    fn test_file_config_merge() {
        let mut config = Config::default();
        let file_config = FileConfig {
            data_dir: Some("/tmp/timelog".to_string()),
            db_filename: Some("work.sqlite3".to_string()),
        };
        config.merge_file_config(&file_config);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/timelog"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/timelog/work.sqlite3"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::default();
        let file_config = FileConfig {
            data_dir: Some("/tmp/from-file".to_string()),
            db_filename: Some("file.sqlite3".to_string()),
        };
        config.merge_file_config(&file_config);

        let cli_args = CliArgs {
            data_dir: Some(PathBuf::from("/tmp/from-cli")),
            db_filename: None,
        };
        config.merge_cli_args(&cli_args);

        // CLIが優先
        assert_eq!(config.data_dir, PathBuf::from("/tmp/from-cli"));
        // ファイル設定が維持
        assert_eq!(config.db_filename, "file.sqlite3");
    }

    #[test]
    fn test_validate_empty_filename() {
        let mut config = Config::default();
        config.db_filename = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_filename_with_separator() {
        let mut config = Config::default();
        config.db_filename = "nested/db.sqlite3".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "data_dir = \"/tmp/custom\"\ndb_filename = \"custom.sqlite3\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path, &CliArgs::default()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/custom"));
        assert_eq!(config.db_filename, "custom.sqlite3");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let cli_args = CliArgs {
            data_dir: Some(temp_dir.path().to_path_buf()),
            db_filename: None,
        };

        let config = Config::load_from(&temp_dir.path().join("missing.toml"), &cli_args).unwrap();
        assert_eq!(config.data_dir, temp_dir.path());
        assert_eq!(config.db_filename, DEFAULT_DB_FILENAME);
    }

    #[test]
    fn test_load_rejects_broken_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "data_dir = [").unwrap();

        let err = Config::load_from(&config_path, &CliArgs::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
