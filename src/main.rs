//! Timelog - プロジェクト単位のタイムトラッカー

mod cli;
mod config;
mod error;
mod logging;
mod report;
mod store;

use error::StoreError;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    logging::init();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // 利用者の操作ミスはメッセージのみ、それ以外は障害として記録
            let is_domain = e
                .downcast_ref::<StoreError>()
                .is_some_and(StoreError::is_domain_error);
            if is_domain {
                eprintln!("{}", e);
                ExitCode::from(1)
            } else {
                error!("{:#}", e);
                eprintln!("エラー: {:#}", e);
                ExitCode::from(2)
            }
        }
    }
}
