//! Attachment - Identity of join resources
//!
//! An attachment resource models a many-to-many relation (a group's roles, a
//! routing group's mapped elements, ...). The remote API has no object for it,
//! so its identifier is derived from the owner ID and the member set:
//! `<owner>-<sum of member hashes>`. Any membership change yields a new ID.
//!
//! The sum is not collision resistant; two different member sets can produce
//! the same ID. The ID only needs to change when membership changes in practice.

use std::collections::BTreeSet;

/// Stable 64-bit hash of a member ID
pub fn member_hash(member: &str) -> u64 {
    let digest = blake3::hash(member.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Synthetic ID for an owner and its member set; member order does not matter
pub fn synthetic_id<S: AsRef<str>>(owner: &str, members: &[S]) -> String {
    let unique: BTreeSet<&str> = members.iter().map(AsRef::as_ref).collect();
    let sum = unique
        .iter()
        .fold(0u64, |acc, m| acc.wrapping_add(member_hash(m)));
    format!("{}-{}", owner, sum)
}

/// Members present both remotely and in configuration, sorted.
///
/// Configured members missing from the authoritative list were removed outside
/// of this resource and are dropped so the next plan re-adds them.
pub fn reconcile<S: AsRef<str>>(authoritative: &[S], configured: &[S]) -> Vec<String> {
    let remote: BTreeSet<&str> = authoritative.iter().map(AsRef::as_ref).collect();
    let local: BTreeSet<&str> = configured.iter().map(AsRef::as_ref).collect();
    remote
        .intersection(&local)
        .map(|s| s.to_string())
        .collect()
}

/// Members to add and to remove when going from `from` to `to`, both sorted
pub fn membership_delta<S: AsRef<str>>(from: &[S], to: &[S]) -> (Vec<String>, Vec<String>) {
    let from: BTreeSet<&str> = from.iter().map(AsRef::as_ref).collect();
    let to: BTreeSet<&str> = to.iter().map(AsRef::as_ref).collect();
    let added = to.difference(&from).map(|s| s.to_string()).collect();
    let removed = from.difference(&to).map(|s| s.to_string()).collect();
    (added, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_member_set_still_has_an_id() {
        let members: [&str; 0] = [];
        assert_eq!(synthetic_id("grp-abc", &members), "grp-abc-0");
    }

    #[test]
    fn id_ignores_member_order_and_duplicates() {
        let a = synthetic_id("grp-abc", &["rol-1", "rol-2"]);
        let b = synthetic_id("grp-abc", &["rol-2", "rol-1", "rol-2"]);
        assert_eq!(a, b);
    }

    #[test]
    fn id_changes_with_membership() {
        let before = synthetic_id("grp-abc", &["rol-1", "rol-2"]);
        let after = synthetic_id("grp-abc", &["rol-1"]);
        assert_ne!(before, after);
        assert!(after.starts_with("grp-abc-"));
        assert_eq!(after, format!("grp-abc-{}", member_hash("rol-1")));
    }

    #[test]
    fn id_is_deterministic() {
        assert_eq!(member_hash("usr-1"), member_hash("usr-1"));
        assert_eq!(
            synthetic_id("usr-1", &["rol-a"]),
            synthetic_id("usr-1", &["rol-a"])
        );
    }

    #[test]
    fn reconcile_drops_members_removed_remotely() {
        let remote = ["rol-1", "rol-3", "rol-9"];
        let local = ["rol-3", "rol-1", "rol-2"];
        assert_eq!(reconcile(&remote, &local), vec!["rol-1", "rol-3"]);
    }

    #[test]
    fn delta_between_member_sets() {
        let (added, removed) = membership_delta(&["a", "b", "c"], &["b", "c", "d"]);
        assert_eq!(added, vec!["d"]);
        assert_eq!(removed, vec!["a"]);
    }
}
