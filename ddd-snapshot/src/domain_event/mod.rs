//! 领域事件（Domain Event）
//!
//! 事件载荷需要实现的最小接口（`DomainEvent`），以及持久化前将载荷与
//! 元数据、业务上下文封装在一起的 `EventEnvelope`。

mod event_context;
mod event_envelope;

pub use event_context::EventContext;
pub use event_envelope::{EventEnvelope, Metadata};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件一经提交即不可变；`aggregate_version` 在单个聚合内从 1 开始严格连续递增。
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync
{
    /// 事件唯一标识
    fn event_id(&self) -> &str;

    /// 事件类型（形如 `ThingyEvent.Pinged`）
    fn event_type(&self) -> &str;

    /// 事件载荷 schema 版本
    fn event_version(&self) -> usize;

    /// 该事件提交后聚合所处的版本
    fn aggregate_version(&self) -> usize;
}
