// In-memory response cache keyed by method path and encoded request.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

/// Memoized successful responses, `method path → encoded request → encoded
/// response`.
///
/// Entries are never evicted or expired. Growth is bounded only by the
/// lifetime of the owning client.
#[derive(Default)]
pub struct ResponseCache {
    methods: RwLock<HashMap<String, HashMap<Bytes, Bytes>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached response for `request` under `method`, if any.
    pub fn get(&self, method: &str, request: &[u8]) -> Option<Bytes> {
        let methods = self.methods.read();
        methods.get(method)?.get(request).cloned()
    }

    /// Store a response, returning the one it replaced.
    pub fn insert(&self, method: &str, request: Bytes, response: Bytes) -> Option<Bytes> {
        let mut methods = self.methods.write();
        match methods.get_mut(method) {
            Some(entries) => entries.insert(request, response),
            None => {
                let mut entries = HashMap::new();
                entries.insert(request, response);
                methods.insert(method.to_string(), entries);
                None
            }
        }
    }

    /// Total number of cached responses across all methods.
    pub fn len(&self) -> usize {
        self.methods.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of responses cached for one method.
    pub fn method_len(&self, method: &str) -> usize {
        self.methods.read().get(method).map_or(0, HashMap::len)
    }
}
