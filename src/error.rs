//! Error taxonomy for the SCR engine.

use thiserror::Error;

/// Failures raised by the solvers, the power-angle engine and the session.
///
/// Parsing never produces one of these: unparsable text falls back to the
/// caller-supplied default instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrError {
    /// The target-SCR quadratic has a negative discriminant.
    #[error("target SCR {target_scr} is unreachable: no real solution")]
    NoRealSolution { target_scr: f64 },

    /// Both roots of the target-SCR quadratic are negative.
    #[error("target SCR {target_scr} is unreachable: no positive line inductance")]
    NoPositiveSolution { target_scr: f64 },

    /// Requested real power lies outside the transferable range.
    #[error("requested power {requested_w:.1} W exceeds limit (P_max = {max_w:.1} W)")]
    PowerExceedsLimit { requested_w: f64, max_w: f64 },

    /// Zero impedance, zero rating or another configuration that would
    /// otherwise divide by zero.
    #[error("degenerate configuration: {0}")]
    Degenerate(String),

    /// Input outside the operation's domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation needs an SCR calculation that has not been run yet.
    #[error("no SCR result available; run the SCR calculation first")]
    NoResult,
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, ScrError>;
