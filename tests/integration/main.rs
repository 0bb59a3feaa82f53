//! End-to-end tests driving the public API.

mod concurrency;
mod fixtures;
mod scenarios;
mod simulation;
