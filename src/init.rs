use env_logger::{Builder, Env};

/// 讀取 `.env` 並初始化 logger，未設定 `RUST_LOG` 時預設為 info
pub fn init() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("Failed to read .env: {e}"),
    }

    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}
