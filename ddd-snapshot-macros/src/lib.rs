//! ddd-snapshot 的过程宏
//!
//! - `#[aggregate]`：为聚合结构体补齐 `id/version/snapshot_version` 并实现 `Entity`
//! - `#[entity_id]`：为单字段 tuple struct 生成标识类型所需的实现
//! - `#[event]`：为事件枚举补齐 `id/aggregate_version` 并实现 `DomainEvent`
//!
use proc_macro::TokenStream;

mod aggregate;
mod domain_event;
mod entity_id;
mod utils;

/// 聚合宏
/// - 追加字段：`id: IdType`, `version: usize`, `snapshot_version: Option<usize>`（若缺失），并置于字段最前
/// - 实现 `::ddd_snapshot::entity::Entity`，其余字段在 `new` 中取 `Default::default()`
/// - 支持参数：`#[aggregate(id = IdType)]`，默认 `String`
#[proc_macro_attribute]
pub fn aggregate(attr: TokenStream, item: TokenStream) -> TokenStream {
    aggregate::expand(attr, item)
}

/// 实体 ID 宏
/// 用于 `struct ThingyId(Uuid);` 这类单字段 tuple struct：
/// - 合并派生：Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize
/// - 生成 `new/value`、`Display`、`FromStr`
/// - 支持参数：`#[entity_id(debug = false)]` 关闭 Debug 派生
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}

/// 事件宏
/// 仅支持具名字段变体，为每个变体追加 `id: String`, `aggregate_version: usize`（若缺失）。
/// - `#[event(version = N)]` 指定事件载荷的默认 schema 版本（默认 1）
/// - 变体可通过 `#[event(event_type = "...", event_version = N)]` 覆写事件类型与版本号
#[proc_macro_attribute]
pub fn event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
