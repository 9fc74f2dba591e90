//! 聚合（Aggregate）抽象
//!
//! 约束一个聚合的核心行为：
//! - `execute` 将命令转换为事件（不改变状态）；
//! - `apply` 将事件投影到领域状态；
//! - `snapshot` / `restore` 完整地导出、恢复领域状态（不是增量）。
//!
//! 版本号的推进与校验集中在 [`AggregateExt`]：事件必须严格连续，快照只能
//! 应用到刚创建的空聚合上，且最多一次。
//!
use crate::domain_event::DomainEvent;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::persist::SnapshotContainer;
use serde::{Serialize, de::DeserializeOwned};
use std::error::Error;

/// 聚合根接口
pub trait Aggregate: Entity {
    /// 聚合类型名，作为事件与快照存储的分区键
    const TYPE: &'static str;

    /// 快照载荷的 schema 版本，载荷结构变化时递增
    const SNAPSHOT_VERSION: usize = 1;

    /// 该聚合支持的命令类型
    type Command: Send;
    /// 该聚合产生的领域事件类型
    type Event: DomainEvent;
    /// 快照载荷类型，必须足以在不重放历史事件的情况下完整重建领域状态
    type Snapshot: Serialize + DeserializeOwned + Send + Sync;
    /// 命令执行或持久化环节的错误类型
    type Error: Error + Send + Sync + 'static;

    /// 执行命令，返回产生的事件列表
    fn execute(&self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// 应用事件，仅更新领域状态（版本由 `AggregateExt::apply_event` 维护）
    fn apply(&mut self, event: &Self::Event);

    /// 导出当前领域状态的快照载荷
    fn snapshot(&self) -> Self::Snapshot;

    /// 用快照载荷替换领域状态
    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// 聚合状态机：Uninitialized → SnapshotApplied → EventsApplied
pub trait AggregateExt: Aggregate {
    /// 应用单个事件，事件版本必须等于当前版本 + 1
    fn apply_event(&mut self, event: &Self::Event) -> DomainResult<()> {
        let expected = self.version() + 1;
        let found = event.aggregate_version();
        if found != expected {
            return Err(DomainError::VersionGap {
                aggregate_type: Self::TYPE.to_string(),
                aggregate_id: self.id().to_string(),
                expected,
                found,
            });
        }

        self.apply(event);
        self.set_version(found);
        Ok(())
    }

    /// 按顺序应用一批事件，遇到断档立即失败
    fn apply_events<'a, I>(&mut self, events: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events.into_iter().try_for_each(|event| self.apply_event(event))
    }

    /// 应用快照：版本与快照版本同时置为快照版本，领域状态整体替换
    fn apply_snapshot(&mut self, container: SnapshotContainer<Self::Snapshot>) -> DomainResult<()> {
        if self.version() != 0 || self.snapshot_version().is_some() {
            return Err(DomainError::SnapshotOnNonEmpty {
                aggregate_type: Self::TYPE.to_string(),
                aggregate_id: self.id().to_string(),
                version: self.version(),
            });
        }

        if container.aggregate_type() != Self::TYPE {
            return Err(DomainError::TypeMismatch {
                expected: Self::TYPE.to_string(),
                found: container.aggregate_type().to_string(),
            });
        }

        let id = self.id().to_string();
        if container.aggregate_id() != id {
            return Err(DomainError::TypeMismatch {
                expected: id,
                found: container.aggregate_id().to_string(),
            });
        }

        let version = container.aggregate_version();
        self.restore(container.into_snapshot());
        self.set_version(version);
        self.set_snapshot_version(Some(version));
        Ok(())
    }
}

impl<A> AggregateExt for A where A: Aggregate {}
