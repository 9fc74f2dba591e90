mod common;

use anyhow::Result as AnyResult;
use common::{Harness, SNAPSHOT_EVERY_VERSION, Thingy, ThingyId};
use ddd_snapshot::aggregate::Aggregate;
use ddd_snapshot::entity::Entity;
use ddd_snapshot::persist::SnapshotPolicy;
use tokio_util::sync::CancellationToken;

fn harness() -> Harness {
    Harness::new(SnapshotPolicy::Every(SNAPSHOT_EVERY_VERSION))
}

#[tokio::test]
async fn get_snapshot_for_unknown_aggregate_returns_none() -> AnyResult<()> {
    let h = harness();
    assert!(h.load_snapshot(&ThingyId::random()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn delete_snapshot_for_unknown_aggregate_does_not_fail() -> AnyResult<()> {
    let h = harness();
    let cancel = CancellationToken::new();
    let id = ThingyId::random();

    h.store
        .snapshots()
        .delete_snapshot::<Thingy>(&id, &cancel)
        .await?;
    h.store
        .snapshots()
        .delete_snapshot::<Thingy>(&id, &cancel)
        .await?;
    Ok(())
}

#[tokio::test]
async fn purge_type_without_snapshots_does_not_fail() -> AnyResult<()> {
    let h = harness();
    h.store
        .snapshots()
        .purge_snapshots::<Thingy>(&CancellationToken::new())
        .await?;
    Ok(())
}

#[tokio::test]
async fn purge_all_on_empty_store_does_not_fail() -> AnyResult<()> {
    let h = harness();
    h.store
        .snapshots()
        .purge_all_snapshots(&CancellationToken::new())
        .await?;
    assert!(h.snapshots.is_empty());
    Ok(())
}

#[tokio::test]
async fn no_snapshot_after_few_events() -> AnyResult<()> {
    let h = harness();
    let id = ThingyId::random();
    h.ping(&id, SNAPSHOT_EVERY_VERSION - 1).await?;

    assert!(h.load_snapshot(&id).await?.is_none());

    let thingy = h.load(&id).await?;
    assert_eq!(thingy.version(), SNAPSHOT_EVERY_VERSION - 1);
    assert_eq!(thingy.snapshot_version(), None);
    Ok(())
}

#[tokio::test]
async fn no_snapshot_exactly_at_threshold() -> AnyResult<()> {
    let h = harness();
    let id = ThingyId::random();
    h.ping(&id, SNAPSHOT_EVERY_VERSION).await?;

    assert!(h.load_snapshot(&id).await?.is_none());
    assert_eq!(h.load(&id).await?.version(), SNAPSHOT_EVERY_VERSION);
    Ok(())
}

#[tokio::test]
async fn snapshot_is_created_when_committing_many_events() -> AnyResult<()> {
    let h = harness();
    let id = ThingyId::random();
    let sent = h.ping(&id, SNAPSHOT_EVERY_VERSION + 1).await?;

    let snapshot = h
        .load_snapshot(&id)
        .await?
        .expect("snapshot after threshold + 1 pings");
    // 快照停在版本 N，只包含前 N 个 ping
    assert_eq!(snapshot.pings_received.len(), SNAPSHOT_EVERY_VERSION);
    assert_eq!(
        snapshot.pings_received.as_slice(),
        &sent[..SNAPSHOT_EVERY_VERSION]
    );
    Ok(())
}

#[tokio::test]
async fn loaded_aggregate_has_correct_versions_when_snapshot_is_applied() -> AnyResult<()> {
    let h = harness();
    let id = ThingyId::random();
    let sent = h.ping(&id, SNAPSHOT_EVERY_VERSION + 1).await?;

    let thingy = h.load(&id).await?;
    assert_eq!(thingy.version(), SNAPSHOT_EVERY_VERSION + 1);
    assert_eq!(thingy.snapshot_version(), Some(SNAPSHOT_EVERY_VERSION));
    assert_eq!(thingy.pings(), sent.as_slice());
    Ok(())
}

#[tokio::test]
async fn snapshot_appears_only_after_one_more_ping() -> AnyResult<()> {
    let h = harness();
    let id = ThingyId::random();

    h.ping(&id, SNAPSHOT_EVERY_VERSION).await?;
    let thingy = h.load(&id).await?;
    assert_eq!(thingy.version(), SNAPSHOT_EVERY_VERSION);
    assert!(h.load_snapshot(&id).await?.is_none());

    h.ping(&id, 1).await?;
    let container = h
        .store
        .snapshots()
        .load_snapshot::<Thingy>(&id, &CancellationToken::new())
        .await?
        .expect("snapshot");
    assert_eq!(container.aggregate_version(), SNAPSHOT_EVERY_VERSION);
    assert_eq!(container.aggregate_id(), id.to_string());

    let thingy = h.load(&id).await?;
    assert_eq!(thingy.version(), SNAPSHOT_EVERY_VERSION + 1);
    assert_eq!(thingy.snapshot_version(), Some(SNAPSHOT_EVERY_VERSION));
    Ok(())
}

#[tokio::test]
async fn snapshot_is_overwritten_not_accumulated() -> AnyResult<()> {
    let h = harness();
    let id = ThingyId::random();
    h.ping(&id, 2 * SNAPSHOT_EVERY_VERSION + 1).await?;

    assert_eq!(h.snapshots.len(), 1);
    let thingy = h.load(&id).await?;
    assert_eq!(thingy.snapshot_version(), Some(2 * SNAPSHOT_EVERY_VERSION));
    assert_eq!(thingy.version(), 2 * SNAPSHOT_EVERY_VERSION + 1);
    Ok(())
}

#[tokio::test]
async fn deleting_snapshot_falls_back_to_full_replay() -> AnyResult<()> {
    let h = harness();
    let cancel = CancellationToken::new();
    let id = ThingyId::random();
    let other = ThingyId::random();
    let sent = h.ping(&id, SNAPSHOT_EVERY_VERSION + 1).await?;
    h.ping(&other, SNAPSHOT_EVERY_VERSION + 1).await?;
    assert_eq!(h.snapshots.len(), 2);

    h.store
        .snapshots()
        .delete_snapshot::<Thingy>(&id, &cancel)
        .await?;
    assert!(h.load_snapshot(&id).await?.is_none());
    assert!(h.load_snapshot(&other).await?.is_some());

    let thingy = h.load(&id).await?;
    assert_eq!(thingy.version(), SNAPSHOT_EVERY_VERSION + 1);
    assert_eq!(thingy.snapshot_version(), None);
    assert_eq!(thingy.pings(), sent.as_slice());

    h.store
        .snapshots()
        .purge_snapshots::<Thingy>(&cancel)
        .await?;
    assert!(h.snapshots.is_empty());
    // 事件日志不受快照维护操作影响
    assert_eq!(
        h.events.stream_len(Thingy::TYPE, &other.to_string()),
        SNAPSHOT_EVERY_VERSION + 1
    );
    Ok(())
}
