//! 事件溯源聚合存储（ddd-snapshot）
//!
//! 以事件日志为唯一事实来源，通过周期性快照缩短聚合重建路径：
//! - 聚合（`aggregate`）与实体（`entity`）建模，版本严格连续；
//! - 领域事件（`domain_event`）及其信封、业务上下文；
//! - 快照读写、schema 上抬与生成策略，以及组合它们的聚合存储（`persist`）；
//! - 面向应用层的命令编排（`aggregate_root`）。
//!
//! 事件源与快照后端都以 trait 形式注入，本 crate 只附带内存实现。
//!
//! 典型用法：
//! 1. 用 `#[aggregate]`、`#[event]` 定义聚合与事件，实现 `Aggregate`；
//! 2. 选择或实现 `EventRepository` 与 `SnapshotPersistence`；
//! 3. 用 `AggregateStoreConfig` 配置快照策略，组装 `AggregateStore`；
//! 4. 通过 `AggregateRoot::execute` 执行命令，快照在提交后按策略自动生成。
//!
pub mod aggregate;
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod persist;

// 允许在本 crate 内部通过 ::ddd_snapshot 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ddd_snapshot 路径。
extern crate self as ddd_snapshot;
