use ddd_snapshot_macros::entity_id;
use std::collections::HashSet;
use uuid::Uuid;

#[entity_id]
struct ThingyId(Uuid);

#[entity_id(debug = false)]
struct ProfileId(String);

impl std::fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileId(..)")
    }
}

fn main() {
    let raw = Uuid::new_v4();
    let id = ThingyId::new(raw);
    assert_eq!(id.value(), &raw);
    assert_eq!(id.to_string(), raw.to_string());

    let parsed: ThingyId = raw.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert!("not-a-uuid".parse::<ThingyId>().is_err());

    let mut ids = HashSet::new();
    ids.insert(id.clone());
    assert!(ids.contains(&parsed));
    let _ = format!("{:?}", id);

    let pid = ProfileId::new("p-1".to_string());
    assert_eq!(format!("{:?}", pid), "ProfileId(..)");
    assert_eq!(pid.to_string(), "p-1");
}
