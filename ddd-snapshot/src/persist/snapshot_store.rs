//! 快照仓储（SnapshotStore）
//!
//! 在 `SnapshotPersistence` 之上提供按聚合类型的强类型读写：
//! - 写入时把 `A::Snapshot` 序列化为带元数据的容器；
//! - 读取时校验类型、按需执行 schema 上抬，再反序列化。
//!
//! 反序列化失败一律上报，绝不当作“没有快照”处理，否则损坏的数据会被
//! 悄悄掩盖成一个空聚合。
//!
use crate::aggregate::Aggregate;
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::{
    SerializedSnapshot, SnapshotContainer, SnapshotMetadata, SnapshotPersistence,
    SnapshotUpcasterChain,
};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct SnapshotStore<P> {
    persistence: P,
    upcasters: SnapshotUpcasterChain,
    timeout: Option<Duration>,
}

impl<P> SnapshotStore<P>
where
    P: SnapshotPersistence,
{
    pub fn new(persistence: P) -> Self {
        Self {
            persistence,
            upcasters: SnapshotUpcasterChain::default(),
            timeout: None,
        }
    }

    /// 注册快照上抬链
    pub fn with_upcasters(mut self, upcasters: SnapshotUpcasterChain) -> Self {
        self.upcasters = upcasters;
        self
    }

    /// 为每次存储调用设置超时，超时视为瞬时错误
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// 读取聚合的最新快照
    pub async fn load_snapshot<A>(
        &self,
        aggregate_id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<Option<SnapshotContainer<A::Snapshot>>>
    where
        A: Aggregate,
    {
        let id = aggregate_id.to_string();
        let Some(raw) = self
            .bounded(self.persistence.get(A::TYPE, &id, cancel))
            .await?
        else {
            tracing::debug!(aggregate_type = A::TYPE, aggregate_id = %id, "no snapshot");
            return Ok(None);
        };

        if raw.aggregate_type() != A::TYPE {
            return Err(DomainError::TypeMismatch {
                expected: A::TYPE.to_string(),
                found: raw.aggregate_type().to_string(),
            });
        }

        let stored_schema = raw.schema_version();
        let raw = if stored_schema == A::SNAPSHOT_VERSION {
            raw
        } else {
            tracing::debug!(
                aggregate_type = A::TYPE,
                aggregate_id = %id,
                from = stored_schema,
                to = A::SNAPSHOT_VERSION,
                "upcasting snapshot"
            );
            self.upcasters.upcast_to(raw, A::SNAPSHOT_VERSION)?
        };

        let container = raw.into_container::<A::Snapshot>()?;
        tracing::debug!(
            aggregate_type = A::TYPE,
            aggregate_id = %id,
            snapshot_version = container.aggregate_version(),
            "snapshot loaded"
        );
        Ok(Some(container))
    }

    /// 写入快照，覆盖该聚合已有的快照
    pub async fn store_snapshot<A>(
        &self,
        aggregate_id: &A::Id,
        snapshot_version: usize,
        snapshot: &A::Snapshot,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        A: Aggregate,
    {
        let id = aggregate_id.to_string();
        let container = SnapshotContainer::new(
            A::TYPE.to_string(),
            id.clone(),
            snapshot_version,
            snapshot,
            SnapshotMetadata::new(A::SNAPSHOT_VERSION, snapshot_type_name::<A>()),
        );
        let raw = SerializedSnapshot::from_container(&container)?;

        self.bounded(self.persistence.put(A::TYPE, &id, raw, cancel))
            .await?;

        tracing::info!(
            aggregate_type = A::TYPE,
            aggregate_id = %id,
            snapshot_version,
            "snapshot stored"
        );
        Ok(())
    }

    /// 删除单个聚合的快照；不存在时为空操作
    pub async fn delete_snapshot<A>(
        &self,
        aggregate_id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        A: Aggregate,
    {
        let id = aggregate_id.to_string();
        self.bounded(self.persistence.delete(A::TYPE, &id, cancel))
            .await
    }

    /// 删除某一聚合类型的全部快照
    pub async fn purge_snapshots<A>(&self, cancel: &CancellationToken) -> Result<()>
    where
        A: Aggregate,
    {
        self.bounded(self.persistence.purge(A::TYPE, cancel))
            .await?;
        tracing::info!(aggregate_type = A::TYPE, "snapshots purged");
        Ok(())
    }

    /// 删除全部快照
    pub async fn purge_all_snapshots(&self, cancel: &CancellationToken) -> Result<()> {
        self.bounded(self.persistence.purge_all(cancel)).await?;
        tracing::info!("all snapshots purged");
        Ok(())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await?,
            None => fut.await,
        }
    }
}

fn snapshot_type_name<A: Aggregate>() -> &'static str {
    let full = std::any::type_name::<A::Snapshot>();
    full.rsplit("::").next().unwrap_or(full)
}
