//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `sidenote_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("sidenote_core ping={}", sidenote_core::ping());
    println!("sidenote_core version={}", sidenote_core::core_version());
}
