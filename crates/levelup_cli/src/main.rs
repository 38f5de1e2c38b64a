//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `levelup_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use levelup_core::db::migrations::latest_version;
use levelup_core::db::open_db_in_memory;

fn main() {
    println!("levelup_core ping={}", levelup_core::ping());
    println!("levelup_core version={}", levelup_core::core_version());

    // Bootstrapping an in-memory database exercises the migration registry
    // without touching any on-disk state.
    match open_db_in_memory() {
        Ok(_conn) => println!("levelup_core schema_version={}", latest_version()),
        Err(err) => {
            eprintln!("levelup_core db bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
