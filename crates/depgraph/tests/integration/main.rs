//! Integration tests running the graph façade against every store.

#[path = "../common/mod.rs"]
mod common;

mod concurrency_test;
mod persistence_test;
mod scenario_test;
