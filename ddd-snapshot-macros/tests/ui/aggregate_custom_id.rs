use ddd_snapshot::entity::Entity;
use ddd_snapshot_macros::{aggregate, entity_id};
use uuid::Uuid;

#[entity_id]
struct OrderId(Uuid);

// 已声明的 version 字段沿用原定义，并被移到最前
#[aggregate(id = OrderId)]
#[derive(Debug)]
struct Order {
    total: u64,
    version: usize,
}

fn main() {
    let id = OrderId::new(Uuid::new_v4());
    let mut order = Order::new(id.clone());
    assert_eq!(order.id(), &id);

    order.set_version(3);
    order.set_snapshot_version(Some(2));
    assert_eq!(order.version(), 3);
    assert_eq!(order.snapshot_version(), Some(2));
    assert_eq!(order.total, 0);
}
