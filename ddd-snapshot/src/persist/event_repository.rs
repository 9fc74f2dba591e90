//! 事件源协议
//!
//! 事件日志本身是外部协作者：这里只约定读取（按版本升序、无断档、有限）
//! 与带期望版本的追加。`InMemoryEventRepository` 是测试与示例用的参考实现。
//!
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::{SerializedEvent, ensure_not_cancelled};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// 读取版本严格大于 `after_version` 的事件，按版本升序
    async fn get_events_after(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        after_version: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SerializedEvent>>;

    /// 追加事件；当前最新版本必须等于 `expected_version`
    async fn append(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        expected_version: usize,
        events: Vec<SerializedEvent>,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

#[async_trait]
impl<T> EventRepository for Arc<T>
where
    T: EventRepository + ?Sized,
{
    async fn get_events_after(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        after_version: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SerializedEvent>> {
        (**self)
            .get_events_after(aggregate_type, aggregate_id, after_version, cancel)
            .await
    }

    async fn append(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        expected_version: usize,
        events: Vec<SerializedEvent>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        (**self)
            .append(aggregate_type, aggregate_id, expected_version, events, cancel)
            .await
    }
}

/// 基于内存的事件源
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: DashMap<(String, String), Vec<SerializedEvent>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个聚合已提交的事件数量（即最新版本）
    pub fn stream_len(&self, aggregate_type: &str, aggregate_id: &str) -> usize {
        self.streams
            .get(&(aggregate_type.to_string(), aggregate_id.to_string()))
            .map(|stream| stream.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn get_events_after(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        after_version: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SerializedEvent>> {
        ensure_not_cancelled(cancel)?;

        let key = (aggregate_type.to_string(), aggregate_id.to_string());
        Ok(self
            .streams
            .get(&key)
            .map(|stream| stream.iter().skip(after_version).cloned().collect())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        expected_version: usize,
        events: Vec<SerializedEvent>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        if events.is_empty() {
            return Ok(());
        }

        let mut stream = self
            .streams
            .entry((aggregate_type.to_string(), aggregate_id.to_string()))
            .or_default();

        if stream.len() != expected_version {
            return Err(DomainError::VersionConflict {
                expected: expected_version,
                actual: stream.len(),
            });
        }

        // 先整体校验再写入，保证追加是全有或全无
        for (offset, event) in events.iter().enumerate() {
            let expected = expected_version + offset + 1;
            if event.aggregate_type() != aggregate_type || event.aggregate_id() != aggregate_id {
                return Err(DomainError::TypeMismatch {
                    expected: format!("{aggregate_type}/{aggregate_id}"),
                    found: format!("{}/{}", event.aggregate_type(), event.aggregate_id()),
                });
            }
            if event.aggregate_version() != expected {
                return Err(DomainError::VersionGap {
                    aggregate_type: aggregate_type.to_string(),
                    aggregate_id: aggregate_id.to_string(),
                    expected,
                    found: event.aggregate_version(),
                });
            }
        }

        stream.extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::EventContext;
    use chrono::Utc;
    use serde_json::json;

    fn ev(id: &str, version: usize) -> SerializedEvent {
        SerializedEvent::builder()
            .event_id(format!("e-{version}"))
            .event_type("ThingyEvent.Pinged".to_string())
            .event_version(1)
            .aggregate_id(id.to_string())
            .aggregate_type("thingy".to_string())
            .aggregate_version(version)
            .occurred_at(Utc::now())
            .payload(json!({}))
            .context(EventContext::default())
            .build()
    }

    #[tokio::test]
    async fn events_after_version_in_order() {
        let repo = InMemoryEventRepository::new();
        let cancel = CancellationToken::new();
        repo.append("thingy", "t-1", 0, (1..=5).map(|v| ev("t-1", v)).collect(), &cancel)
            .await
            .unwrap();

        let tail = repo
            .get_events_after("thingy", "t-1", 3, &cancel)
            .await
            .unwrap();
        let versions: Vec<usize> = tail.iter().map(|e| e.aggregate_version()).collect();
        assert_eq!(versions, vec![4, 5]);

        assert!(
            repo.get_events_after("thingy", "t-2", 0, &cancel)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let repo = InMemoryEventRepository::new();
        let cancel = CancellationToken::new();
        repo.append("thingy", "t-1", 0, vec![ev("t-1", 1)], &cancel)
            .await
            .unwrap();

        let err = repo
            .append("thingy", "t-1", 0, vec![ev("t-1", 1)], &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn gapped_batch_is_rejected_whole() {
        let repo = InMemoryEventRepository::new();
        let cancel = CancellationToken::new();

        let err = repo
            .append("thingy", "t-1", 0, vec![ev("t-1", 1), ev("t-1", 3)], &cancel)
            .await
            .unwrap_err();
        assert!(err.is_consistency());
        assert_eq!(repo.stream_len("thingy", "t-1"), 0);
    }
}
