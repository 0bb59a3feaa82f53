//! CARDBOARD: collectible card economy simulator core
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod random;
pub mod catalog;
pub mod valuation;
pub mod inventory;
pub mod market;
pub mod grading;
pub mod trading;
pub mod state;
pub mod engine;
pub mod storage;
