//! File export for calculation results.

pub mod export;
