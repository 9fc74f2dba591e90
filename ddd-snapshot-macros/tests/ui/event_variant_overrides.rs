use ddd_snapshot::domain_event::DomainEvent;
use ddd_snapshot_macros::event;
use serde::{Deserialize, Serialize};

#[event]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum BankEvent {
    #[event(event_type = "bank.opened")]
    Opened {
        id: String,
        aggregate_version: usize,
        name: String,
    },
    #[event(event_type = "bank.renamed", event_version = 3)]
    Renamed { to: String },
    Closed {},
}

fn main() {
    let opened = BankEvent::Opened {
        id: "e-1".into(),
        aggregate_version: 1,
        name: "main".into(),
    };
    assert_eq!(opened.event_type(), "bank.opened");
    assert_eq!(opened.event_version(), 1);

    let renamed = BankEvent::Renamed {
        id: "e-2".into(),
        aggregate_version: 2,
        to: "savings".into(),
    };
    assert_eq!(renamed.event_type(), "bank.renamed");
    assert_eq!(renamed.event_version(), 3);

    let closed = BankEvent::Closed {
        id: "e-3".into(),
        aggregate_version: 3,
    };
    assert_eq!(closed.event_type(), "BankEvent.Closed");
    assert_eq!(closed.aggregate_version(), 3);
}
