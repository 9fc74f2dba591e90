//! 快照策略
//!
//! 纯函数：根据聚合版本与上一次快照版本决定是否生成新快照。
//!
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "interval")]
pub enum SnapshotPolicy {
    /// 从不生成快照
    Never,
    /// 版本恰为 N 的整数倍时生成（版本 0 除外）
    Every(usize),
    /// 距上一次快照累计 N 个版本后生成；一次提交多个事件时不会错过边界
    EveryFewVersions(usize),
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        SnapshotPolicy::Every(100)
    }
}

impl SnapshotPolicy {
    pub fn should_snapshot(&self, version: usize, snapshot_version: Option<usize>) -> bool {
        if version == 0 || snapshot_version.is_some_and(|s| s >= version) {
            return false;
        }

        match self {
            SnapshotPolicy::Never => false,
            SnapshotPolicy::Every(interval) => {
                let interval = (*interval).max(1);
                version.is_multiple_of(interval)
            }
            SnapshotPolicy::EveryFewVersions(interval) => {
                let interval = (*interval).max(1);
                version - snapshot_version.unwrap_or(0) >= interval
            }
        }
    }
}
