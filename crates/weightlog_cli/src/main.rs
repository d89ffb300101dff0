//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `weightlog_core` linkage.
//! - Print where the store and exports live under the current environment.

use weightlog_core::{file_locations, CoreConfig, FallbackExportDirectory, RecordStore};

fn main() {
    println!("weightlog_core ping={}", weightlog_core::ping());
    println!("weightlog_core version={}", weightlog_core::core_version());

    let config = CoreConfig::from_env();
    let resolver = FallbackExportDirectory::from_config(&config);
    println!("{}", file_locations(&config.db_path, &resolver).summary());

    let store = RecordStore::new(config.db_path.clone());
    match (store.count_weights(), store.count_journal()) {
        (Ok(weights), Ok(journals)) => {
            println!("weightlog_core weights={weights} journals={journals}")
        }
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("weightlog_core store_error={err}");
            std::process::exit(1);
        }
    }
}
