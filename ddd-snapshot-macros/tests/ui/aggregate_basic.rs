use ddd_snapshot::entity::Entity;
use ddd_snapshot_macros::aggregate;

#[aggregate]
#[derive(Debug, Clone)]
struct Account {
    name: String,
    tags: Vec<String>,
}

fn main() {
    let account = Account::new("acc-1".to_string());
    assert_eq!(account.id(), "acc-1");
    assert_eq!(account.version(), 0);
    assert_eq!(account.snapshot_version(), None);
    assert!(account.name.is_empty());
    assert!(account.tags.is_empty());
}
