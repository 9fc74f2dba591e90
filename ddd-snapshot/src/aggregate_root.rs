//! 聚合根编排器（AggregateRoot）
//!
//! 封装“加载聚合 → 执行命令 → 应用事件 → 追加事件 → 按策略生成快照”的标准流程，
//! 以 `AggregateStore` 为依赖，便于在应用层直接调用。
//!
//! 快照针对命令执行前加载到的状态：该状态已经完整持久化，只有在事件追加成功后
//! 才写入；写入失败不会让命令失败。
//!
use crate::{
    aggregate::{Aggregate, AggregateExt},
    domain_event::{EventContext, EventEnvelope},
    error::DomainError,
    persist::{AggregateStore, EventRepository, SnapshotPersistence, serialize_events},
};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 面向应用层的聚合根编排器。
///
/// - `A`：聚合类型（实现 `Aggregate`）
/// - `E`：事件源
/// - `P`：快照存储后端
pub struct AggregateRoot<A, E, P>
where
    A: Aggregate,
{
    store: Arc<AggregateStore<E, P>>,
    _marker: PhantomData<A>,
}

impl<A, E, P> AggregateRoot<A, E, P>
where
    A: Aggregate,
    A::Error: From<DomainError>,
    E: EventRepository,
    P: SnapshotPersistence,
{
    /// 创建编排器实例
    pub fn new(store: Arc<AggregateStore<E, P>>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &AggregateStore<E, P> {
        &self.store
    }

    /// 加载聚合的最新状态
    pub async fn load(
        &self,
        aggregate_id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<A, A::Error> {
        Ok(self.store.load::<A>(aggregate_id, cancel).await?)
    }

    /// 执行聚合命令：
    /// 1. 加载聚合（不存在时为版本 0 的空聚合）；
    /// 2. 执行命令得到新事件；
    /// 3. 应用事件到聚合状态；
    /// 4. 以加载时的版本为期望版本追加事件；
    /// 5. 若加载时的状态处于快照边界，尽力写入快照。
    #[tracing::instrument(
        skip(self, aggregate_id, command, context, cancel),
        fields(aggregate_type = A::TYPE, aggregate_id = %aggregate_id)
    )]
    pub async fn execute(
        &self,
        aggregate_id: &A::Id,
        command: A::Command,
        context: EventContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<EventEnvelope<A>>, A::Error> {
        let mut aggregate = self.store.load::<A>(aggregate_id, cancel).await?;
        let loaded_version = aggregate.version();
        let pending_snapshot = self
            .store
            .snapshot_due(&aggregate)
            .then(|| aggregate.snapshot());

        let events = aggregate.execute(command)?;
        if events.is_empty() {
            return Ok(vec![]);
        }

        aggregate.apply_events(&events)?;

        let envelopes: Vec<EventEnvelope<A>> = events
            .into_iter()
            .map(|event| EventEnvelope::new(aggregate_id, event, context.clone()))
            .collect();

        let serialized = serialize_events(&envelopes)?;
        self.store
            .events()
            .append(
                A::TYPE,
                &aggregate_id.to_string(),
                loaded_version,
                serialized,
                cancel,
            )
            .await?;

        tracing::debug!(
            from = loaded_version,
            to = aggregate.version(),
            "events committed"
        );

        if let Some(snapshot) = pending_snapshot {
            self.store
                .store_snapshot_best_effort::<A>(aggregate_id, loaded_version, &snapshot, cancel)
                .await;
        }

        Ok(envelopes)
    }
}
