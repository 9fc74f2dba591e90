//! 统一错误定义
//!
//! 按照重建流程的失败语义划分：
//! - 一致性错误（版本断档、快照重复应用、类型不匹配）：说明历史已损坏，致命且不可重试；
//! - 反序列化错误：快照载荷无法按当前 schema 解码，交由调用方决定是否回退到全量重放；
//! - 瞬时存储错误（超时、连接失败）与取消：可重试。
//!
//! “未找到”不是错误，统一以 `Option::None` 表达。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error(
        "snapshot deserialization failed: type={aggregate_type}, id={aggregate_id}, reason={reason}"
    )]
    Deserialization {
        aggregate_type: String,
        aggregate_id: String,
        reason: String,
    },
    #[error("snapshot upcast failed: type={aggregate_type}, from_version={from_version}, reason={reason}")]
    UpcastFailed {
        aggregate_type: String,
        from_version: usize,
        reason: String,
    },

    // --- 一致性 ---
    #[error(
        "version gap: type={aggregate_type}, id={aggregate_id}, expected={expected}, found={found}"
    )]
    VersionGap {
        aggregate_type: String,
        aggregate_id: String,
        expected: usize,
        found: usize,
    },
    #[error(
        "snapshot applied to non-empty aggregate: type={aggregate_type}, id={aggregate_id}, version={version}"
    )]
    SnapshotOnNonEmpty {
        aggregate_type: String,
        aggregate_id: String,
        version: usize,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 存储 ---
    #[error("transient storage error: {reason}")]
    TransientStorage { reason: String },
    #[error("operation cancelled")]
    Cancelled,
    #[error("event repository error: {reason}")]
    EventRepository { reason: String },
    #[error("snapshot repository error: {reason}")]
    SnapshotRepository { reason: String },
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict { expected: usize, actual: usize },

    // --- 命令与状态 ---
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
}

impl DomainError {
    /// 是否为可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::TransientStorage { .. } | DomainError::Cancelled
        )
    }

    /// 是否为一致性错误（历史损坏，重试无意义）
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            DomainError::VersionGap { .. }
                | DomainError::SnapshotOnNonEmpty { .. }
                | DomainError::TypeMismatch { .. }
        )
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<tokio::time::error::Elapsed> for DomainError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        DomainError::TransientStorage {
            reason: format!("timed out: {err}"),
        }
    }
}
