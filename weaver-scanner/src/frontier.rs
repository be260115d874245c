use std::collections::{HashSet, VecDeque};
use url::Url;

/// A pending unit of work: fetch `url`, which was found on `parent_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: Url,
    pub parent_url: Option<Url>,
    pub depth: u32,
}

impl FrontierItem {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            parent_url: None,
            depth: 1,
        }
    }

    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            parent_url: Some(self.url.clone()),
            depth: self.depth + 1,
        }
    }
}

/// Dedup key for a URL. Scheme and host are already lowercased and dot segments
/// resolved by the `url` parser, so only the fragment needs dropping.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.into()
}

/// Breadth-first work queue with per-run visitation dedup.
///
/// A URL is marked visited when it is enqueued, not when it is fetched, so two
/// pages linking to the same target never queue it twice.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierItem>,
    visited: HashSet<String>,
    max_depth: u32,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Returns `true` if the item was accepted.
    pub fn enqueue(&mut self, mut item: FrontierItem) -> bool {
        if item.depth > self.max_depth {
            return false;
        }

        if !self.visited.insert(normalize_url(&item.url)) {
            return false;
        }

        item.url.set_fragment(None);
        self.queue.push_back(item);
        true
    }

    pub fn dequeue(&mut self) -> Option<FrontierItem> {
        self.queue.pop_front()
    }

    pub fn size(&self) -> usize {
        self.queue.len()
    }

    /// Drops pending items but keeps the visited set.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}
