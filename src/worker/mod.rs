//! Worker pools: fixed-size concurrent dispatch over a bucket source.

pub mod broker_pool;
pub mod file_pool;
