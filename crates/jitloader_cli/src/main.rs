//! Command-line smoke check for the native loader.
//!
//! # Responsibility
//! - Drive the process-wide loader once and report the outcome.
//! - Exit non-zero with the full error chain when loading fails.

use std::process::ExitCode;

fn main() -> ExitCode {
    println!("jitloader version={}", jitloader_core::loader_version());

    if let Some(log_dir) = std::env::args().nth(1) {
        if let Err(err) = jitloader_core::logging::init_logging_from_env(&log_dir) {
            eprintln!("jitloader logging disabled: {err}");
        }
    }

    match jitloader_core::global::default_configuration() {
        Ok(handle) => {
            if let Ok(loader) = jitloader_core::global::instance() {
                println!("jitloader library={}", loader.library_path().display());
                println!("jitloader byte_code={}", loader.byte_code_file_path().display());
            }
            println!("jitloader default_configuration={handle}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("jitloader error={}", jitloader_core::error_chain(&err));
            ExitCode::FAILURE
        }
    }
}
