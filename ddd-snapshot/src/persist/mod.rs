//! 持久化与事件溯源（persist）
//!
//! 围绕“快照 + 尾部事件”的聚合重建，提供：
//! - 事件源协议与按版本读取（`EventRepository`）；
//! - 快照存储协议（`SnapshotPersistence`）及强类型仓储（`SnapshotStore`）；
//! - 快照 schema 上抬（`SnapshotUpcasterChain`）与生成策略（`SnapshotPolicy`）；
//! - 组合以上能力的聚合存储（`AggregateStore`）。
//!
//! 该模块只定义协议与装配逻辑，具体存储后端由上层实现并注入；
//! 内存实现用于测试与示例。
//!
mod aggregate_store;
mod event_repository;
mod serialized_event;
mod serialized_snapshot;
mod snapshot_persistence;
mod snapshot_policy;
mod snapshot_store;
mod snapshot_upcaster;

pub use aggregate_store::{AggregateStore, AggregateStoreConfig, committed_range};
pub use event_repository::{EventRepository, InMemoryEventRepository};
pub use serialized_event::{SerializedEvent, deserialize_events, serialize_events};
pub use serialized_snapshot::{SerializedSnapshot, SnapshotContainer, SnapshotMetadata};
pub use snapshot_persistence::{InMemorySnapshotPersistence, SnapshotPersistence};
pub use snapshot_policy::SnapshotPolicy;
pub use snapshot_store::SnapshotStore;
pub use snapshot_upcaster::{SnapshotUpcaster, SnapshotUpcasterChain};

use crate::error::{DomainError, DomainResult};
use tokio_util::sync::CancellationToken;

/// 存储操作开始前检查取消信号
pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken) -> DomainResult<()> {
    if cancel.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}
