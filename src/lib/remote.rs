//! Merging of remote evidence (partner breakends and partner regions).
//!
//! Junctions and discordant groups both collect observations of a remote location. A
//! new observation is merged into the first existing entry it matches, otherwise it is
//! appended. Entries that come to match after a merge are coalesced as well, so the
//! final collection does not depend on the order observations arrive in.

/// An observation of evidence at a remote location.
pub trait RemoteEvidence {
    /// True if `other` describes the same remote location as `self`.
    fn matches(&self, other: &Self) -> bool;

    /// Folds `other` into `self`.
    fn absorb(&mut self, other: Self);
}

/// Merges `item` into `entries`.
pub fn merge_remote<T: RemoteEvidence>(entries: &mut Vec<T>, item: T) {
    let Some(mut index) = entries.iter().position(|e| e.matches(&item)) else {
        entries.push(item);
        return;
    };
    entries[index].absorb(item);

    // The grown entry may now match others
    loop {
        let other = (0..entries.len()).find(|&j| j != index && entries[index].matches(&entries[j]));
        let Some(j) = other else { break };
        let absorbed = entries.remove(j);
        if j < index {
            index -= 1;
        }
        entries[index].absorb(absorbed);
    }
}
