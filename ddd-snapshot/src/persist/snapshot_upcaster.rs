//! 快照上抬（Snapshot Upcasting）
//!
//! 快照载荷结构演进后，旧 schema 的快照在读取路径上通过 `SnapshotUpcaster`
//! 逐级转换到当前 schema。无法转换到目标版本时返回错误，由调用方决定
//! 是否回退到全量重放。
//!
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::SerializedSnapshot;
use std::sync::Arc;

/// 快照 schema 升级器
pub trait SnapshotUpcaster: Send + Sync {
    fn applies(&self, aggregate_type: &str, schema_version: usize) -> bool;

    /// 返回的快照 schema 版本必须大于输入版本
    fn upcast(&self, snapshot: SerializedSnapshot) -> Result<SerializedSnapshot>;
}

impl<T> SnapshotUpcaster for Arc<T>
where
    T: SnapshotUpcaster + ?Sized,
{
    fn applies(&self, aggregate_type: &str, schema_version: usize) -> bool {
        (**self).applies(aggregate_type, schema_version)
    }

    fn upcast(&self, snapshot: SerializedSnapshot) -> Result<SerializedSnapshot> {
        (**self).upcast(snapshot)
    }
}

/// 快照升级链：按顺序查找匹配的升级器，直到到达目标版本
#[derive(Default, Clone)]
pub struct SnapshotUpcasterChain {
    stages: Vec<Arc<dyn SnapshotUpcaster>>,
}

impl SnapshotUpcasterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: Arc<dyn SnapshotUpcaster>) -> Self {
        self.stages.push(stage);
        self
    }

    /// 将快照升级到 `target_version`
    pub fn upcast_to(
        &self,
        mut snapshot: SerializedSnapshot,
        target_version: usize,
    ) -> Result<SerializedSnapshot> {
        if snapshot.schema_version() > target_version {
            return Err(DomainError::Deserialization {
                aggregate_type: snapshot.aggregate_type().to_string(),
                aggregate_id: snapshot.aggregate_id().to_string(),
                reason: format!(
                    "snapshot schema v{} is newer than supported v{target_version}",
                    snapshot.schema_version()
                ),
            });
        }

        while snapshot.schema_version() < target_version {
            let from_version = snapshot.schema_version();
            let Some(stage) = self
                .stages
                .iter()
                .find(|s| s.applies(snapshot.aggregate_type(), from_version))
            else {
                return Err(DomainError::Deserialization {
                    aggregate_type: snapshot.aggregate_type().to_string(),
                    aggregate_id: snapshot.aggregate_id().to_string(),
                    reason: format!(
                        "no upcaster from snapshot schema v{from_version} to v{target_version}"
                    ),
                });
            };

            let aggregate_type = snapshot.aggregate_type().to_string();
            snapshot = stage.upcast(snapshot)?;

            if snapshot.schema_version() <= from_version {
                return Err(DomainError::UpcastFailed {
                    aggregate_type,
                    from_version,
                    reason: "upcaster did not advance the schema version".to_string(),
                });
            }
        }

        Ok(snapshot)
    }
}

impl FromIterator<Arc<dyn SnapshotUpcaster>> for SnapshotUpcasterChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn SnapshotUpcaster>>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}
