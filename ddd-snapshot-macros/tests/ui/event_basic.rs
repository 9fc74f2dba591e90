use ddd_snapshot::domain_event::DomainEvent;
use ddd_snapshot_macros::event;
use serde::{Deserialize, Serialize};

#[event(version = 2)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ThingyEvent {
    Pinged { ping_id: String },
    Renamed { name: String },
}

fn main() {
    let ev = ThingyEvent::Pinged {
        id: "e-1".to_string(),
        aggregate_version: 7,
        ping_id: "p-1".to_string(),
    };
    assert_eq!(ev.event_id(), "e-1");
    assert_eq!(ev.event_type(), "ThingyEvent.Pinged");
    assert_eq!(ev.event_version(), 2);
    assert_eq!(ev.aggregate_version(), 7);
}
