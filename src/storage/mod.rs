//! 存储层模块
//!
//! 提供数据持久化服务，支持 SurrealDB 与进程内存储。

pub mod factory;
pub mod surrealdb;

pub use factory::{Repositories, StorageFactory};
