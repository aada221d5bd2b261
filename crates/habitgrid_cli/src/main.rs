//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `habitgrid_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("habitgrid_core version={}", habitgrid_core::core_version());
    println!(
        "habitgrid_core default_log_level={}",
        habitgrid_core::default_log_level()
    );
}
