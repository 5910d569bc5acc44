/// Macro to build a synced [`HistoryTree`] and the [`MemoryLedger`] it mirrors
///
/// Each `value => salt` pair is inserted through the ledger and synced, in order
///
/// ```rust
/// # use histree::{history, ledger::Ledger};
/// let (tree, ledger) = history! {
///   "a" => 4u64,
///   "c" => 7u64,
/// };
///
/// assert_eq!(tree.root(), ledger.root().unwrap());
/// assert_eq!(tree.running_count(), 4);
/// ```
///
/// # Panics
///
/// Panics if any pair is committed twice
///
/// [`HistoryTree`]: crate::HistoryTree
/// [`MemoryLedger`]: crate::ledger::MemoryLedger
#[macro_export]
macro_rules! history {
    {} => {{ ($crate::HistoryTree::new(), $crate::ledger::MemoryLedger::new()) }};
    { $($value:expr => $salt:expr),+ $(,)? } => {{
        let mut ledger = $crate::ledger::MemoryLedger::new();
        let mut tree = $crate::HistoryTree::new();
        $(
            tree.insert(&mut ledger, $value, $salt).unwrap();
            tree.sync(&ledger).unwrap();
        )+
        (tree, ledger)
    }};
}

#[cfg(test)]
mod tests {
    use crate::{hash::Digest, ledger::Ledger};

    #[test]
    fn simple_syntax_test() {
        let (tree, _) = history! {
            "hello" => 1u64,
            "world" => 2u64  // without trailing comma
        };

        let (other_tree, ledger) = history! {
            "hello" => 1u64,
            "world" => 2u64,  // with trailing comma
        };

        assert_eq!(tree.root(), other_tree.root());
        assert_eq!(tree.root(), ledger.root().unwrap());
        assert_eq!(ledger.events().len(), 2);

        let (empty, empty_ledger) = history! {};
        assert_eq!(empty.root(), Digest::ZERO);
        assert_eq!(empty_ledger.root().unwrap(), Digest::ZERO);

        let (_single, _) = history! { "only" => "salt" };
    }
}
