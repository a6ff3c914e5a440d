//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use scr_calc::model::{Rl, System};

/// 380 V / 250 kVA / 60 Hz system used throughout the reference scenario.
pub fn reference_system() -> System {
    System::new(380.0, 250_000.0, 60.0)
}

/// 75 µH purely inductive line.
pub fn reference_line() -> Rl {
    Rl::new(0.0, 7.5e-5)
}

/// Small resistive-inductive transformer.
pub fn small_transformer() -> Rl {
    Rl::new(0.002, 2e-5)
}

/// Path to a bundled scenario file.
pub fn scenario_path(name: &str) -> String {
    format!("{}/scenarios/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Asserts `|a - b| <= tol · max(1, |b|)`.
pub fn assert_close(a: f64, b: f64, tol: f64, what: &str) {
    let scale = b.abs().max(1.0);
    assert!(
        (a - b).abs() <= tol * scale,
        "{what}: expected {b}, got {a} (tol {tol})"
    );
}
