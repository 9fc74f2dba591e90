#![allow(dead_code)]

use ddd_snapshot::aggregate::Aggregate;
use ddd_snapshot::aggregate_root::AggregateRoot;
use ddd_snapshot::domain_event::{EventContext, EventEnvelope};
use ddd_snapshot::entity::Entity;
use ddd_snapshot::error::DomainError;
use ddd_snapshot::persist::{
    AggregateStore, AggregateStoreConfig, EventRepository, InMemoryEventRepository,
    InMemorySnapshotPersistence, SerializedEvent, SnapshotPolicy, SnapshotStore, serialize_events,
};
use ddd_snapshot_macros::{aggregate, entity_id, event};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const SNAPSHOT_EVERY_VERSION: usize = 10;

#[entity_id]
pub struct ThingyId(Uuid);

impl ThingyId {
    pub fn random() -> Self {
        Self::new(Uuid::new_v4())
    }
}

#[aggregate(id = ThingyId)]
#[derive(Debug, Clone, PartialEq)]
pub struct Thingy {
    pings: Vec<Uuid>,
}

impl Thingy {
    pub fn pings(&self) -> &[Uuid] {
        &self.pings
    }
}

#[derive(Debug)]
pub enum ThingyCommand {
    Ping { ping_id: Uuid },
    PingMany { ping_ids: Vec<Uuid> },
}

#[event(version = 1)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThingyEvent {
    Pinged { ping_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingySnapshot {
    pub pings_received: Vec<Uuid>,
}

impl Aggregate for Thingy {
    const TYPE: &'static str = "thingy";
    type Command = ThingyCommand;
    type Event = ThingyEvent;
    type Snapshot = ThingySnapshot;
    type Error = DomainError;

    fn execute(&self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let ping_ids = match command {
            ThingyCommand::Ping { ping_id } => vec![ping_id],
            ThingyCommand::PingMany { ping_ids } if ping_ids.is_empty() => {
                return Err(DomainError::InvalidCommand {
                    reason: "at least one ping".into(),
                });
            }
            ThingyCommand::PingMany { ping_ids } => ping_ids,
        };

        Ok(ping_ids
            .into_iter()
            .enumerate()
            .map(|(offset, ping_id)| pinged(self.version() + offset + 1, ping_id))
            .collect())
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ThingyEvent::Pinged { ping_id, .. } => self.pings.push(*ping_id),
        }
    }

    fn snapshot(&self) -> Self::Snapshot {
        ThingySnapshot {
            pings_received: self.pings.clone(),
        }
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.pings = snapshot.pings_received;
    }
}

pub fn pinged(version: usize, ping_id: Uuid) -> ThingyEvent {
    ThingyEvent::Pinged {
        id: ulid::Ulid::new().to_string(),
        aggregate_version: version,
        ping_id,
    }
}

/// 直接构造版本 `from..=to` 的已序列化事件，绕过命令路径
pub fn pinged_events(id: &ThingyId, from: usize, to: usize) -> Vec<SerializedEvent> {
    let envelopes: Vec<EventEnvelope<Thingy>> = (from..=to)
        .map(|v| EventEnvelope::new(id, pinged(v, Uuid::new_v4()), EventContext::default()))
        .collect();
    serialize_events(&envelopes).unwrap()
}

pub type MemStore = AggregateStore<Arc<InMemoryEventRepository>, Arc<InMemorySnapshotPersistence>>;

pub struct Harness {
    pub events: Arc<InMemoryEventRepository>,
    pub snapshots: Arc<InMemorySnapshotPersistence>,
    pub store: Arc<MemStore>,
    pub root: AggregateRoot<Thingy, Arc<InMemoryEventRepository>, Arc<InMemorySnapshotPersistence>>,
}

impl Harness {
    pub fn new(policy: SnapshotPolicy) -> Self {
        let events = Arc::new(InMemoryEventRepository::new());
        let snapshots = Arc::new(InMemorySnapshotPersistence::new());
        let store = Arc::new(AggregateStore::new(
            Arc::clone(&events),
            SnapshotStore::new(Arc::clone(&snapshots)),
            AggregateStoreConfig::with_policy(policy),
        ));
        let root = AggregateRoot::new(Arc::clone(&store));

        Self {
            events,
            snapshots,
            store,
            root,
        }
    }

    pub async fn ping(&self, id: &ThingyId, times: usize) -> anyhow::Result<Vec<Uuid>> {
        let cancel = CancellationToken::new();
        let mut sent = Vec::with_capacity(times);
        for _ in 0..times {
            let ping_id = Uuid::new_v4();
            self.root
                .execute(
                    id,
                    ThingyCommand::Ping { ping_id },
                    EventContext::default(),
                    &cancel,
                )
                .await?;
            sent.push(ping_id);
        }
        Ok(sent)
    }

    pub async fn load(&self, id: &ThingyId) -> anyhow::Result<Thingy> {
        Ok(self
            .store
            .load::<Thingy>(id, &CancellationToken::new())
            .await?)
    }

    pub async fn load_snapshot(&self, id: &ThingyId) -> anyhow::Result<Option<ThingySnapshot>> {
        let container = self
            .store
            .snapshots()
            .load_snapshot::<Thingy>(id, &CancellationToken::new())
            .await?;
        Ok(container.map(|c| c.into_snapshot()))
    }
}

/// 无快照、逐条重放全部事件得到的聚合
pub async fn full_replay<E>(events: E, id: &ThingyId) -> anyhow::Result<Thingy>
where
    E: EventRepository,
{
    let no_snapshots = AggregateStore::new(
        events,
        SnapshotStore::new(InMemorySnapshotPersistence::new()),
        AggregateStoreConfig::with_policy(SnapshotPolicy::Never),
    );
    Ok(no_snapshots
        .load::<Thingy>(id, &CancellationToken::new())
        .await?)
}

pub fn assert_same_state(a: &Thingy, b: &Thingy) {
    assert_eq!(a.id(), b.id());
    assert_eq!(a.version(), b.version());
    assert_eq!(a.pings(), b.pings());
}
