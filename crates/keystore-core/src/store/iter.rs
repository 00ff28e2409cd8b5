//! Forward-only iterator over a listed key snapshot

use super::traits::StoreResult;
use crate::types::CancellationToken;

/// Snapshot of the keys returned by `KeyStore::list`
///
/// The keys are materialized when the list call completes, so iterating never
/// touches the network. Order is the order the backend returned.
#[derive(Debug)]
pub struct KeyIter {
    keys: Vec<String>,
    index: usize,
    cancel: CancellationToken,
}

impl KeyIter {
    pub fn new(keys: Vec<String>, cancel: CancellationToken) -> Self {
        Self {
            keys,
            index: 0,
            cancel,
        }
    }

    /// Return the current key and whether another key follows it
    ///
    /// Past the end this returns `("", false)` and can be called repeatedly.
    pub fn next_key(&mut self) -> (String, bool) {
        let key = match self.keys.get(self.index) {
            Some(key) => {
                self.index += 1;
                key.clone()
            }
            None => String::new(),
        };
        (key, self.index < self.keys.len())
    }

    /// Number of keys not yet returned
    pub fn remaining(&self) -> usize {
        self.keys.len().saturating_sub(self.index)
    }

    /// Drop the snapshot and report the error carried by the list context
    pub fn close(&mut self) -> StoreResult<()> {
        self.keys = Vec::new();
        self.index = 0;
        self.cancel.check()
    }
}

impl Iterator for KeyIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let key = self.keys.get(self.index).cloned()?;
        self.index += 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    fn iter_of(keys: &[&str]) -> KeyIter {
        KeyIter::new(
            keys.iter().map(|k| k.to_string()).collect(),
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_empty_iter() {
        let mut iter = iter_of(&[]);
        assert_eq!(iter.next_key(), (String::new(), false));
        assert_eq!(iter.next_key(), (String::new(), false));
    }

    #[test]
    fn test_more_flag() {
        let mut iter = iter_of(&["key-1", "key-2"]);
        assert_eq!(iter.next_key(), ("key-1".to_string(), true));
        assert_eq!(iter.next_key(), ("key-2".to_string(), false));
        assert_eq!(iter.next_key(), (String::new(), false));
        assert_eq!(iter.next_key(), (String::new(), false));
    }

    #[test]
    fn test_std_iterator() {
        let iter = iter_of(&["a", "b", "c"]);
        assert_eq!(iter.size_hint(), (3, Some(3)));
        let keys: Vec<String> = iter.collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_close_releases_keys() {
        let mut iter = iter_of(&["a", "b"]);
        assert!(iter.close().is_ok());
        assert_eq!(iter.remaining(), 0);
        assert_eq!(iter.next_key(), (String::new(), false));
    }

    #[test]
    fn test_close_reports_cancellation() {
        let cancel = CancellationToken::new();
        let mut iter = KeyIter::new(vec!["a".to_string()], cancel.clone());
        cancel.cancel();
        assert!(matches!(iter.close(), Err(StoreError::Cancelled)));
    }
}
