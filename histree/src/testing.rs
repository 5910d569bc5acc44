use crate::{replay::ELEMENTS_PER_APPEND, AppendEvent, Commitment, HistoryTree};

/// The `i`th commitment of a test history, distinct for every `i`
pub fn commitment(i: u64) -> Commitment {
    Commitment::new(format!("value-{i}"), i)
}

/// The append events the ledger emits for `commitment(0)..commitment(k)`
pub fn events_for(k: u64) -> Vec<AppendEvent> {
    (0..k)
        .map(|i| AppendEvent::new(commitment(i).digest(), (i + 1) * ELEMENTS_PER_APPEND))
        .collect()
}

/// A tree with `commitment(0)..commitment(k)` recorded locally and appended
pub fn committed_tree(k: u64) -> HistoryTree {
    let mut tree = HistoryTree::new();
    for i in 0..k {
        tree.record_commitment(commitment(i)).unwrap();
    }
    tree.replay(events_for(k)).unwrap();
    tree
}
