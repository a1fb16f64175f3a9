//! DeFi liquidation-risk and APY-trend forecasting.
//!
//! Each predictor serves from a trained random forest when one is loaded
//! and from a fixed heuristic otherwise.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
