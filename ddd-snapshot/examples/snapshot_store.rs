/// 快照聚合存储示例
/// 演示按策略自动生成快照、从“快照 + 尾部事件”重建聚合，以及快照的删除与清理
/// 运行：RUST_LOG=ddd_snapshot=debug cargo run --example snapshot_store
use anyhow::Result as AnyResult;
use ddd_snapshot::aggregate::Aggregate;
use ddd_snapshot::aggregate_root::AggregateRoot;
use ddd_snapshot::domain_event::EventContext;
use ddd_snapshot::entity::Entity;
use ddd_snapshot::error::DomainError;
use ddd_snapshot::persist::{
    AggregateStore, AggregateStoreConfig, InMemoryEventRepository, InMemorySnapshotPersistence,
    SnapshotStore,
};
use ddd_snapshot_macros::{aggregate, entity_id, event};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ulid::Ulid;
use uuid::Uuid;

// ============================================================================
// 领域模型定义
// ============================================================================

#[entity_id]
struct OrderId(Uuid);

#[aggregate(id = OrderId)]
#[derive(Debug, Clone)]
struct Order {
    status: OrderStatus,
    total_amount: i64,
    items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
enum OrderStatus {
    #[default]
    Draft,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct OrderItem {
    product_id: String,
    quantity: u32,
    price: i64,
}

#[derive(Debug)]
enum OrderCommand {
    AddItem { item: OrderItem },
    Confirm,
}

#[event(version = 1)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum OrderEvent {
    ItemAdded { item: OrderItem },
    Confirmed {},
}

/// 快照载荷：完整导出领域状态，不依赖历史事件
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrderSnapshot {
    status: OrderStatus,
    total_amount: i64,
    items: Vec<OrderItem>,
}

impl Aggregate for Order {
    const TYPE: &'static str = "order";

    type Command = OrderCommand;
    type Event = OrderEvent;
    type Snapshot = OrderSnapshot;
    type Error = DomainError;

    fn execute(&self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if self.status == OrderStatus::Confirmed {
            return Err(DomainError::InvalidState {
                reason: "order already confirmed".into(),
            });
        }

        match command {
            OrderCommand::AddItem { item } => {
                if item.quantity == 0 {
                    return Err(DomainError::InvalidCommand {
                        reason: "quantity must be > 0".into(),
                    });
                }
                Ok(vec![OrderEvent::ItemAdded {
                    id: Ulid::new().to_string(),
                    aggregate_version: self.version() + 1,
                    item,
                }])
            }
            OrderCommand::Confirm => Ok(vec![OrderEvent::Confirmed {
                id: Ulid::new().to_string(),
                aggregate_version: self.version() + 1,
            }]),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::ItemAdded { item, .. } => {
                self.total_amount += item.price * i64::from(item.quantity);
                self.items.push(item.clone());
            }
            OrderEvent::Confirmed { .. } => self.status = OrderStatus::Confirmed,
        }
    }

    fn snapshot(&self) -> Self::Snapshot {
        OrderSnapshot {
            status: self.status.clone(),
            total_amount: self.total_amount,
            items: self.items.clone(),
        }
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.status = snapshot.status;
        self.total_amount = snapshot.total_amount;
        self.items = snapshot.items;
    }
}

// ============================================================================
// 演示
// ============================================================================

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ddd_snapshot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 配置通常来自配置文件
    let config: AggregateStoreConfig = serde_json::from_str(
        r#"{
            "snapshot_policy": { "kind": "every", "interval": 5 },
            "snapshot_timeout_ms": 500
        }"#,
    )?;
    println!("配置: {config:?}");

    let store = Arc::new(AggregateStore::new(
        InMemoryEventRepository::new(),
        SnapshotStore::new(InMemorySnapshotPersistence::new()),
        config,
    ));
    let orders = AggregateRoot::<Order, _, _>::new(Arc::clone(&store));
    let cancel = CancellationToken::new();
    let order_id = OrderId::new(Uuid::new_v4());

    println!("\n=== 添加商品 ===");
    for n in 1..=7u32 {
        let context = EventContext::builder()
            .correlation_id(format!("cor-{n}"))
            .actor_type("user".into())
            .actor_id("u-1".into())
            .build();
        let envelopes = orders
            .execute(
                &order_id,
                OrderCommand::AddItem {
                    item: OrderItem {
                        product_id: format!("sku-{n}"),
                        quantity: n,
                        price: 100,
                    },
                },
                context,
                &cancel,
            )
            .await?;
        println!(
            "版本 {} 已提交",
            envelopes[0].metadata.aggregate_version()
        );
    }

    let snapshot = store
        .snapshots()
        .load_snapshot::<Order>(&order_id, &cancel)
        .await?;
    if let Some(snapshot) = &snapshot {
        println!(
            "快照版本 {}，包含 {} 件商品",
            snapshot.aggregate_version(),
            snapshot.snapshot().items.len()
        );
    }

    println!("\n=== 从快照重建 ===");
    let order = orders.load(&order_id, &cancel).await?;
    println!(
        "版本 {}，快照版本 {:?}，总额 {}",
        order.version(),
        order.snapshot_version(),
        order.total_amount
    );

    println!("\n=== 确认订单 ===");
    orders
        .execute(
            &order_id,
            OrderCommand::Confirm,
            EventContext::default(),
            &cancel,
        )
        .await?;
    match orders
        .execute(
            &order_id,
            OrderCommand::Confirm,
            EventContext::default(),
            &cancel,
        )
        .await
    {
        Err(e) => println!("重复确认被拒绝: {e}"),
        Ok(_) => println!("重复确认竟然成功了"),
    }

    println!("\n=== 删除快照后全量重放 ===");
    store
        .snapshots()
        .delete_snapshot::<Order>(&order_id, &cancel)
        .await?;
    let order = orders.load(&order_id, &cancel).await?;
    println!(
        "版本 {}，快照版本 {:?}，状态 {:?}",
        order.version(),
        order.snapshot_version(),
        order.status
    );

    store.snapshots().purge_all_snapshots(&cancel).await?;
    println!("\n✅ 示例完成");
    Ok(())
}
