use chroma_overlay_batch::component::ChromaCompositeBatch;
use chroma_overlay_batch::config::Config;
use chroma_overlay_batch::init;
use console::style;
use log::{error, info};
use rust_i18n::t;
use std::process::ExitCode;

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en-US");

fn main() -> ExitCode {
    init::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e:#}");
            eprintln!("{} {e:#}", style(t!("main.error_prefix")).red().bold());
            return ExitCode::FAILURE;
        }
    };
    rust_i18n::set_locale(config.language.as_str());

    match ChromaCompositeBatch::new(config).run() {
        Ok(report) if report.all_succeeded() => {
            info!("Program exited normally");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            info!("Program exited with {} failed videos", report.failed());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Program error: {e:#}");
            eprintln!("{} {e:#}", style(t!("main.error_prefix")).red().bold());
            ExitCode::FAILURE
        }
    }
}
