#![doc = include_str!("../README.md")]

mod admission;
mod config;
mod connection;
mod error;
mod executor;
mod pool;
mod rand;
mod stats;
mod task;
mod task_pool;
#[cfg(test)]
mod testing;

pub use crate::admission::*;
pub use crate::config::*;
pub use crate::connection::*;
pub use crate::error::*;
pub use crate::executor::Executor;
pub use crate::pool::{PushError, WorkerPool};
pub use crate::rand::*;
pub use crate::stats::PoolStats;
pub use crate::task::*;
pub use crate::task_pool::*;
