use crate::paper::Source;
use std::collections::HashMap;

/// Every source seen during one run, deduplicated by URL
#[derive(Debug, Default)]
pub struct SourceLedger {
    sources: Vec<Source>,
    by_url: HashMap<String, usize>,
}

impl SourceLedger {
    pub fn position(&self, url: &str) -> Option<usize> {
        self.by_url.get(url).copied()
    }

    /// Record a source; a URL already present keeps its first entry
    pub fn push(&mut self, source: Source) -> usize {
        if let Some(idx) = self.position(&source.url) {
            return idx;
        }
        let idx = self.sources.len();
        self.by_url.insert(source.url.clone(), idx);
        self.sources.push(source);
        idx
    }

    pub fn get(&self, idx: usize) -> Option<&Source> {
        self.sources.get(idx)
    }

    /// Index of the source if it has usable text
    pub fn usable(&self, idx: usize) -> Option<usize> {
        self.get(idx)
            .filter(|s| s.summary.is_some())
            .map(|_| idx)
    }

    pub fn into_sources(self) -> Vec<Source> {
        self.sources
    }
}
