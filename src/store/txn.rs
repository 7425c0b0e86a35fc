use std::collections::{BTreeMap, BTreeSet};

/// Raw key space shared by every backend.
pub type KeySpace = BTreeMap<String, Vec<u8>>;

/// Read access available inside both read-only and read-write transactions.
pub trait ReadTxn {
    fn get(
        &self,
        key: &str,
    ) -> Option<&[u8]>;

    /// Keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(
        &self,
        prefix: &str,
    ) -> Vec<String>;

    fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.get(key).is_some()
    }
}

/// Read-only view over a consistent snapshot of the key space.
pub struct ViewTxn<'a> {
    data: &'a KeySpace,
}

/// Read-write transaction. Writes are staged and only become visible to
/// other transactions when the store commits them.
pub struct UpdateTxn<'a> {
    data: &'a KeySpace,
    pending: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'a> ViewTxn<'a> {
    pub(crate) fn new(data: &'a KeySpace) -> Self {
        Self { data }
    }
}

impl<'a> UpdateTxn<'a> {
    pub(crate) fn new(data: &'a KeySpace) -> Self {
        Self {
            data,
            pending: BTreeMap::new(),
        }
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: Vec<u8>,
    ) {
        self.pending.insert(key.into(), Some(value));
    }

    /// Stages a delete; returns whether the key was visible before.
    pub fn delete(
        &mut self,
        key: &str,
    ) -> bool {
        let existed = self.contains(key);
        self.pending.insert(key.to_string(), None);
        existed
    }

    /// Whether the transaction staged any write.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn into_pending(self) -> BTreeMap<String, Option<Vec<u8>>> {
        self.pending
    }
}

fn prefix_keys(
    data: &KeySpace,
    prefix: &str,
) -> BTreeSet<String> {
    data.range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, _)| k.clone())
        .collect()
}

impl ReadTxn for ViewTxn<'_> {
    fn get(
        &self,
        key: &str,
    ) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    fn keys_with_prefix(
        &self,
        prefix: &str,
    ) -> Vec<String> {
        prefix_keys(self.data, prefix).into_iter().collect()
    }
}

impl ReadTxn for UpdateTxn<'_> {
    fn get(
        &self,
        key: &str,
    ) -> Option<&[u8]> {
        match self.pending.get(key) {
            Some(Some(value)) => Some(value.as_slice()),
            Some(None) => None,
            None => self.data.get(key).map(Vec::as_slice),
        }
    }

    fn keys_with_prefix(
        &self,
        prefix: &str,
    ) -> Vec<String> {
        let mut keys = prefix_keys(self.data, prefix);
        for (key, value) in &self.pending {
            if !key.starts_with(prefix) {
                continue;
            }
            match value {
                Some(_) => keys.insert(key.clone()),
                None => keys.remove(key),
            };
        }
        keys.into_iter().collect()
    }
}
