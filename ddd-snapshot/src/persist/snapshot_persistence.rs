//! 快照持久化协议（原始存储层）
//!
//! 只负责按 (聚合类型, 聚合 ID) 读写单个快照容器，不包含任何业务逻辑。
//! 每个 (类型, ID) 至多保留一个快照，写入即覆盖。
//!
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::{SerializedSnapshot, ensure_not_cancelled};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait SnapshotPersistence: Send + Sync {
    /// 读取快照；不存在时返回 `Ok(None)`
    async fn get(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SerializedSnapshot>>;

    /// 原子地覆盖写入快照
    async fn put(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        snapshot: SerializedSnapshot,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// 删除快照；不存在时为空操作
    async fn delete(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// 删除某一聚合类型的全部快照
    async fn purge(&self, aggregate_type: &str, cancel: &CancellationToken) -> Result<()>;

    /// 删除全部快照
    async fn purge_all(&self, cancel: &CancellationToken) -> Result<()>;
}

#[async_trait]
impl<T> SnapshotPersistence for Arc<T>
where
    T: SnapshotPersistence + ?Sized,
{
    async fn get(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SerializedSnapshot>> {
        (**self).get(aggregate_type, aggregate_id, cancel).await
    }

    async fn put(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        snapshot: SerializedSnapshot,
        cancel: &CancellationToken,
    ) -> Result<()> {
        (**self)
            .put(aggregate_type, aggregate_id, snapshot, cancel)
            .await
    }

    async fn delete(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        (**self).delete(aggregate_type, aggregate_id, cancel).await
    }

    async fn purge(&self, aggregate_type: &str, cancel: &CancellationToken) -> Result<()> {
        (**self).purge(aggregate_type, cancel).await
    }

    async fn purge_all(&self, cancel: &CancellationToken) -> Result<()> {
        (**self).purge_all(cancel).await
    }
}

/// 基于内存的快照持久化实现
///
/// 以 (类型, ID) 为键的 `DashMap`，单条写入即整体替换，读者不会观察到半写状态。
#[derive(Debug, Default)]
pub struct InMemorySnapshotPersistence {
    snapshots: DashMap<(String, String), SerializedSnapshot>,
}

impl InMemorySnapshotPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的快照数量
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotPersistence for InMemorySnapshotPersistence {
    async fn get(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SerializedSnapshot>> {
        ensure_not_cancelled(cancel)?;

        let key = (aggregate_type.to_string(), aggregate_id.to_string());
        Ok(self.snapshots.get(&key).map(|entry| entry.value().clone()))
    }

    async fn put(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        snapshot: SerializedSnapshot,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        if snapshot.aggregate_type() != aggregate_type || snapshot.aggregate_id() != aggregate_id {
            return Err(DomainError::SnapshotRepository {
                reason: format!(
                    "snapshot for {}/{} written under key {aggregate_type}/{aggregate_id}",
                    snapshot.aggregate_type(),
                    snapshot.aggregate_id()
                ),
            });
        }

        self.snapshots.insert(
            (aggregate_type.to_string(), aggregate_id.to_string()),
            snapshot,
        );
        Ok(())
    }

    async fn delete(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        self.snapshots
            .remove(&(aggregate_type.to_string(), aggregate_id.to_string()));
        Ok(())
    }

    async fn purge(&self, aggregate_type: &str, cancel: &CancellationToken) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        self.snapshots.retain(|(ty, _), _| ty != aggregate_type);
        Ok(())
    }

    async fn purge_all(&self, cancel: &CancellationToken) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        self.snapshots.clear();
        Ok(())
    }
}
