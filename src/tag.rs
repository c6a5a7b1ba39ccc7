//! String interning for GEDCOM tags.
//!
//! Every node carries a short all-uppercase tag (NAME, SEX, FAMC, ...). Tags
//! repeat enormously across a database, so they are drawn from one
//! process-wide interned pool and shared between nodes. Entries live for the
//! life of the process and are never removed.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// An interned tag string, cheaply cloneable and shared between nodes.
pub type Tag = Arc<str>;

/// The process-wide tag pool.
///
/// Stores one copy of each distinct tag and hands out shared references to
/// it. Lookup takes a read lock; only the first occurrence of a tag takes the
/// write lock.
pub struct TagPool {
    tags: RwLock<HashMap<Box<str>, Tag>>,
}

impl TagPool {
    fn new() -> Self {
        TagPool {
            tags: RwLock::new(HashMap::new()),
        }
    }

    /// Interns a tag, returning the shared copy.
    pub fn intern(&self, tag: &str) -> Tag {
        {
            let tags = self.tags.read().unwrap();
            if let Some(interned) = tags.get(tag) {
                return Arc::clone(interned);
            }
        }

        let mut tags = self.tags.write().unwrap();
        // Another caller may have inserted it between the locks.
        if let Some(interned) = tags.get(tag) {
            return Arc::clone(interned);
        }
        let interned: Tag = Arc::from(tag);
        tags.insert(tag.into(), Arc::clone(&interned));
        interned
    }

    /// Returns the number of distinct interned tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.read().unwrap().len()
    }

    /// Returns true if no tags have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.read().unwrap().is_empty()
    }
}

/// Returns the process-wide tag pool, creating it on first use.
pub fn tag_pool() -> &'static TagPool {
    static POOL: OnceLock<TagPool> = OnceLock::new();
    POOL.get_or_init(TagPool::new)
}

/// Interns a tag in the process-wide pool.
#[must_use]
pub fn intern(tag: &str) -> Tag {
    tag_pool().intern(tag)
}
