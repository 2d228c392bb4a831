use keycache_application::ports::StaticKeySource;
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed key-value map, usually fed from `[fallback.values]`.
#[derive(Debug, Clone, Default)]
pub struct MapKeySource {
    values: HashMap<String, String>,
}

impl MapKeySource {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapKeySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl StaticKeySource for MapKeySource {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Consults several static sources in order; the first hit wins.
#[derive(Clone, Default)]
pub struct LayeredKeySource {
    sources: Vec<Arc<dyn StaticKeySource>>,
}

impl LayeredKeySource {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn StaticKeySource>) -> Self {
        self.sources.push(source);
        self
    }
}

impl StaticKeySource for LayeredKeySource {
    fn lookup(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.lookup(key))
    }
}
