//! 聚合存储（AggregateStore）
//!
//! 重建流程：空聚合 → 应用最新快照（若有）→ 读取快照版本之后的事件 → 逐个连续应用。
//! “快照 + 尾部事件”与“从版本 1 全量重放”得到的状态必须完全一致。
//!
//! 写路径提交成功后，根据 `SnapshotPolicy` 尽力生成快照：失败只记录日志，
//! 不影响已经提交的命令。
//!
use crate::aggregate::{Aggregate, AggregateExt};
use crate::domain_event::DomainEvent;
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::{
    EventRepository, SnapshotContainer, SnapshotPersistence, SnapshotPolicy, SnapshotStore,
    deserialize_events,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 聚合存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateStoreConfig {
    /// 快照生成策略
    pub snapshot_policy: SnapshotPolicy,
    /// 快照读取出现瞬时错误时按“无快照”处理并全量重放
    pub snapshot_read_fallback: bool,
    /// 单次快照读写的超时（毫秒）
    pub snapshot_timeout_ms: Option<u64>,
}

impl Default for AggregateStoreConfig {
    fn default() -> Self {
        Self {
            snapshot_policy: SnapshotPolicy::default(),
            snapshot_read_fallback: true,
            snapshot_timeout_ms: None,
        }
    }
}

impl AggregateStoreConfig {
    pub fn with_policy(snapshot_policy: SnapshotPolicy) -> Self {
        Self {
            snapshot_policy,
            ..Self::default()
        }
    }

    pub fn snapshot_timeout(&self) -> Option<Duration> {
        self.snapshot_timeout_ms.map(Duration::from_millis)
    }
}

pub struct AggregateStore<E, P> {
    events: E,
    snapshots: SnapshotStore<P>,
    config: AggregateStoreConfig,
}

impl<E, P> AggregateStore<E, P>
where
    E: EventRepository,
    P: SnapshotPersistence,
{
    pub fn new(events: E, snapshots: SnapshotStore<P>, config: AggregateStoreConfig) -> Self {
        let snapshots = match config.snapshot_timeout() {
            Some(timeout) => snapshots.with_timeout(Some(timeout)),
            None => snapshots,
        };

        Self {
            events,
            snapshots,
            config,
        }
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn snapshots(&self) -> &SnapshotStore<P> {
        &self.snapshots
    }

    pub fn config(&self) -> &AggregateStoreConfig {
        &self.config
    }

    /// 重建聚合到最新版本；没有任何事件与快照时返回版本 0 的空聚合
    #[tracing::instrument(
        skip(self, aggregate_id, cancel),
        fields(aggregate_type = A::TYPE, aggregate_id = %aggregate_id)
    )]
    pub async fn load<A>(&self, aggregate_id: &A::Id, cancel: &CancellationToken) -> Result<A>
    where
        A: Aggregate,
    {
        self.reconstitute(aggregate_id, None, cancel).await
    }

    /// 重建聚合到指定版本；比目标版本新的快照会被忽略
    pub async fn load_at<A>(
        &self,
        aggregate_id: &A::Id,
        version: usize,
        cancel: &CancellationToken,
    ) -> Result<A>
    where
        A: Aggregate,
    {
        let aggregate: A = self.reconstitute(aggregate_id, Some(version), cancel).await?;
        if aggregate.version() != version {
            return Err(DomainError::VersionGap {
                aggregate_type: A::TYPE.to_string(),
                aggregate_id: aggregate_id.to_string(),
                expected: version,
                found: aggregate.version(),
            });
        }

        Ok(aggregate)
    }

    async fn reconstitute<A>(
        &self,
        aggregate_id: &A::Id,
        target: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<A>
    where
        A: Aggregate,
    {
        let mut aggregate = A::new(aggregate_id.clone());

        if let Some(container) = self.read_snapshot::<A>(aggregate_id, cancel).await? {
            if target.is_none_or(|t| container.aggregate_version() <= t) {
                aggregate.apply_snapshot(container)?;
            }
        }

        let id = aggregate_id.to_string();
        let serialized = self
            .events
            .get_events_after(A::TYPE, &id, aggregate.version(), cancel)
            .await?;

        let within_target = |version: usize| target.is_none_or(|t| version <= t);
        let tail: Vec<_> = serialized
            .into_iter()
            .take_while(|event| within_target(event.aggregate_version()))
            .collect();

        // 事件源返回了其他聚合的记录
        if let Some(foreign) = tail
            .iter()
            .find(|event| event.aggregate_type() != A::TYPE || event.aggregate_id() != id)
        {
            return Err(DomainError::TypeMismatch {
                expected: format!("{}/{id}", A::TYPE),
                found: format!("{}/{}", foreign.aggregate_type(), foreign.aggregate_id()),
            });
        }

        let envelopes = deserialize_events::<A>(&tail)?;

        for envelope in &envelopes {
            let recorded = envelope.metadata.aggregate_version();
            let carried = envelope.payload.aggregate_version();
            if recorded != carried {
                return Err(DomainError::VersionGap {
                    aggregate_type: A::TYPE.to_string(),
                    aggregate_id: id,
                    expected: recorded,
                    found: carried,
                });
            }
            aggregate.apply_event(&envelope.payload)?;
        }

        tracing::debug!(
            version = aggregate.version(),
            snapshot_version = ?aggregate.snapshot_version(),
            events_applied = envelopes.len(),
            "aggregate loaded"
        );
        Ok(aggregate)
    }

    async fn read_snapshot<A>(
        &self,
        aggregate_id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<Option<SnapshotContainer<A::Snapshot>>>
    where
        A: Aggregate,
    {
        match self.snapshots.load_snapshot::<A>(aggregate_id, cancel).await {
            Err(DomainError::TransientStorage { reason }) if self.config.snapshot_read_fallback => {
                tracing::warn!(
                    aggregate_type = A::TYPE,
                    aggregate_id = %aggregate_id,
                    %reason,
                    "snapshot read failed; replaying full history"
                );
                Ok(None)
            }
            other => other,
        }
    }

    /// 已加载（尚未执行命令）的聚合是否处于快照边界
    pub fn snapshot_due<A>(&self, aggregate: &A) -> bool
    where
        A: Aggregate,
    {
        self.config
            .snapshot_policy
            .should_snapshot(aggregate.version(), aggregate.snapshot_version())
    }

    /// 提交后的快照钩子
    ///
    /// `committed` 为本次提交的版本区间。策略针对命令执行前加载到的版本
    /// （`committed.start() - 1`）求值，命中时重建该版本的状态并写入快照。
    /// 返回是否写入了快照；任何失败都只记录日志。
    #[tracing::instrument(
        skip(self, aggregate_id, cancel),
        fields(aggregate_type = A::TYPE, aggregate_id = %aggregate_id)
    )]
    pub async fn on_events_committed<A>(
        &self,
        aggregate_id: &A::Id,
        committed: RangeInclusive<usize>,
        cancel: &CancellationToken,
    ) -> bool
    where
        A: Aggregate,
    {
        if committed.is_empty() {
            return false;
        }

        let decided_on = committed.start().saturating_sub(1);
        // 带快照版本的判定只会更严格，先用无快照版本做廉价预判
        if !self.config.snapshot_policy.should_snapshot(decided_on, None) {
            return false;
        }

        let aggregate = match self.load_at::<A>(aggregate_id, decided_on, cancel).await {
            Ok(aggregate) => aggregate,
            Err(e) => {
                tracing::warn!(error = %e, version = decided_on, "cannot rebuild state for snapshot");
                return false;
            }
        };

        if !self.snapshot_due(&aggregate) {
            return false;
        }

        self.store_snapshot_best_effort::<A>(aggregate_id, decided_on, &aggregate.snapshot(), cancel)
            .await
    }

    pub(crate) async fn store_snapshot_best_effort<A>(
        &self,
        aggregate_id: &A::Id,
        version: usize,
        snapshot: &A::Snapshot,
        cancel: &CancellationToken,
    ) -> bool
    where
        A: Aggregate,
    {
        match self
            .snapshots
            .store_snapshot::<A>(aggregate_id, version, snapshot, cancel)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    aggregate_type = A::TYPE,
                    aggregate_id = %aggregate_id,
                    version,
                    error = %e,
                    "failed to store snapshot"
                );
                false
            }
        }
    }
}

/// 一次提交的事件所覆盖的版本区间，供外部写路径调用 `on_events_committed`
pub fn committed_range<Ev: DomainEvent>(events: &[Ev]) -> Option<RangeInclusive<usize>> {
    let first = events.first()?.aggregate_version();
    let last = events.last()?.aggregate_version();
    Some(first..=last)
}
