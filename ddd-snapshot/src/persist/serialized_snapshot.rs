//! 快照容器
//!
//! - `SerializedSnapshot`：持久化层看到的原始形态，载荷为 JSON；
//! - `SnapshotContainer<S>`：反序列化后的强类型形态。
//!
//! 两者共享同一份 `SnapshotMetadata`，其中 `schema_version` 决定读取时是否需要上抬。
//!
use crate::error::{DomainError, DomainResult as Result};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// 快照元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// 载荷 schema 版本
    schema_version: usize,
    /// 载荷类型名
    snapshot_type: String,
    /// 快照生成时间
    created_at: DateTime<Utc>,
}

impl SnapshotMetadata {
    pub fn new(schema_version: usize, snapshot_type: impl Into<String>) -> Self {
        Self {
            schema_version,
            snapshot_type: snapshot_type.into(),
            created_at: Utc::now(),
        }
    }

    pub fn schema_version(&self) -> usize {
        self.schema_version
    }

    pub fn snapshot_type(&self) -> &str {
        &self.snapshot_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 持久化层的快照容器
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct SerializedSnapshot {
    aggregate_id: String,
    aggregate_type: String,
    /// 快照对应的聚合版本
    aggregate_version: usize,
    payload: Value,
    metadata: SnapshotMetadata,
}

impl SerializedSnapshot {
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_version(&self) -> usize {
        self.aggregate_version
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn schema_version(&self) -> usize {
        self.metadata.schema_version
    }

    /// 替换载荷并声明新的 schema 版本（供上抬器使用）
    pub fn with_payload(mut self, payload: Value, schema_version: usize) -> Self {
        self.payload = payload;
        self.metadata.schema_version = schema_version;
        self
    }

    /// 从强类型容器序列化
    pub fn from_container<S>(container: &SnapshotContainer<S>) -> Result<Self>
    where
        S: Serialize,
    {
        Ok(Self {
            aggregate_id: container.aggregate_id.clone(),
            aggregate_type: container.aggregate_type.clone(),
            aggregate_version: container.aggregate_version,
            payload: serde_json::to_value(&container.snapshot)?,
            metadata: container.metadata.clone(),
        })
    }

    /// 反序列化为强类型容器；失败时返回 `Deserialization`，不会退化为空状态
    pub fn into_container<S>(self) -> Result<SnapshotContainer<S>>
    where
        S: DeserializeOwned,
    {
        let snapshot =
            serde_json::from_value(self.payload).map_err(|e| DomainError::Deserialization {
                aggregate_type: self.aggregate_type.clone(),
                aggregate_id: self.aggregate_id.clone(),
                reason: e.to_string(),
            })?;

        Ok(SnapshotContainer {
            aggregate_type: self.aggregate_type,
            aggregate_id: self.aggregate_id,
            aggregate_version: self.aggregate_version,
            snapshot,
            metadata: self.metadata,
        })
    }
}

/// 强类型快照容器
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotContainer<S> {
    aggregate_type: String,
    aggregate_id: String,
    aggregate_version: usize,
    snapshot: S,
    metadata: SnapshotMetadata,
}

impl<S> SnapshotContainer<S> {
    pub fn new(
        aggregate_type: String,
        aggregate_id: String,
        aggregate_version: usize,
        snapshot: S,
        metadata: SnapshotMetadata,
    ) -> Self {
        Self {
            aggregate_type,
            aggregate_id,
            aggregate_version,
            snapshot,
            metadata,
        }
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_version(&self) -> usize {
        self.aggregate_version
    }

    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn into_snapshot(self) -> S {
        self.snapshot
    }
}
