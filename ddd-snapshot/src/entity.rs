//! 实体（Entity）基础抽象
//!
//! 为聚合提供统一的标识、版本与快照版本。版本号的推进只能由
//! [`AggregateExt`](crate::aggregate::AggregateExt) 完成，领域代码只读取。
//!
use std::{fmt::Display, str::FromStr};

/// 具备唯一标识、版本与快照版本的实体抽象
///
/// 通常由 `#[aggregate]` 宏生成实现。
pub trait Entity: Send + Sync {
    /// 实体标识类型，要求可解析、可显示与可克隆
    type Id: FromStr + Clone + Display + Send + Sync;

    /// 使用给定标识创建空实体（版本 0，无快照版本）
    fn new(aggregate_id: Self::Id) -> Self;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;

    /// 获取当前版本（最后一个已应用事件的版本）
    fn version(&self) -> usize;

    /// 获取已应用快照的版本；未应用快照时为 `None`
    fn snapshot_version(&self) -> Option<usize>;

    #[doc(hidden)]
    fn set_version(&mut self, version: usize);

    #[doc(hidden)]
    fn set_snapshot_version(&mut self, snapshot_version: Option<usize>);
}
