//! Two-tier definition repository.
//!
//! # Architecture
//!
//! ```text
//! lookup(key)
//!   ├─ standard table (sorted, immutable, no lock)   hit → return
//!   ├─ dynamic table (sorted, read lock)             hit → return
//!   └─ dynamic table (write lock)
//!        ├─ re-check                                 hit → return winner's definition
//!        └─ build, insert under every complete name in sorted position
//! ```
//!
//! Both tables are kept sorted by complete name, so lookups are binary
//! searches. A key is either a raw name or a `(prefix, name)` pair compared as
//! the virtual string `prefix:name` without allocating it, which also means
//! a prefix that is only a string prefix of a longer name never matches.
//!
//! # Thread Safety
//!
//! Repositories are shared by all concurrent renders. The dynamic table is
//! append-only and always sorted, so a poisoned lock is recovered from.

use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock};

use crate::definition::Indexed;
use crate::error::MarkupError;

/// Lookup key for a definition.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NameKey<'a> {
    /// A name as written, matched against every complete name.
    Raw(&'a str),
    /// An explicit prefix and local name, matched as `prefix:name`.
    Prefixed { prefix: &'a str, name: &'a str },
}

impl NameKey<'_> {
    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        let (first, separator, second) = match *self {
            Self::Raw(raw) => (raw, None, ""),
            Self::Prefixed { prefix, name } => (prefix, Some(':'), name),
        };
        first.chars().chain(separator).chain(second.chars())
    }
}

/// Compare a stored complete name with a key.
fn compare(entry: &str, key: &NameKey<'_>, case_sensitive: bool) -> Ordering {
    if case_sensitive {
        entry.chars().cmp(key.chars())
    } else {
        entry
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(key.chars().flat_map(char::to_lowercase))
    }
}

type Entries<D> = Vec<(String, Arc<D>)>;

fn search<D>(entries: &Entries<D>, key: &NameKey<'_>, case_sensitive: bool) -> Result<usize, usize> {
    entries.binary_search_by(|(entry, _)| compare(entry, key, case_sensitive))
}

pub(crate) struct DefinitionRepository<D> {
    case_sensitive: bool,
    standard: Entries<D>,
    dynamic: RwLock<Entries<D>>,
}

impl<D: Indexed> DefinitionRepository<D> {
    /// Create a repository seeded with `standard` definitions.
    pub(crate) fn new(case_sensitive: bool, standard: Vec<Arc<D>>) -> Self {
        let mut entries: Entries<D> = standard
            .iter()
            .flat_map(|definition| {
                definition
                    .index_names()
                    .iter()
                    .map(move |name| (name.clone(), Arc::clone(definition)))
            })
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries.dedup_by(|(a, _), (b, _)| a == b);
        Self {
            case_sensitive,
            standard: entries,
            dynamic: RwLock::new(Vec::new()),
        }
    }

    /// Find the definition for `key`, building and caching it on first sight.
    ///
    /// `build` runs under the write lock, at most once per novel name. Its
    /// definition must be indexed under a complete name equal to `key`.
    pub(crate) fn get_or_insert(
        &self,
        key: NameKey<'_>,
        build: impl FnOnce() -> Result<D, MarkupError>,
    ) -> Result<Arc<D>, MarkupError> {
        if let Ok(index) = search(&self.standard, &key, self.case_sensitive) {
            return Ok(Arc::clone(&self.standard[index].1));
        }

        {
            let dynamic = self.dynamic.read().unwrap_or_else(PoisonError::into_inner);
            if let Ok(index) = search(&dynamic, &key, self.case_sensitive) {
                return Ok(Arc::clone(&dynamic[index].1));
            }
        }

        let mut dynamic = self.dynamic.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have inserted it while we waited for the write lock
        if let Ok(index) = search(&dynamic, &key, self.case_sensitive) {
            return Ok(Arc::clone(&dynamic[index].1));
        }

        let definition = Arc::new(build()?);
        for name in definition.index_names() {
            let name_key = NameKey::Raw(name);
            if let Err(position) = search(&dynamic, &name_key, self.case_sensitive) {
                dynamic.insert(position, (name.clone(), Arc::clone(&definition)));
            }
        }
        tracing::debug!(
            names = ?definition.index_names(),
            dynamic_size = dynamic.len(),
            "Registered dynamic definition"
        );
        Ok(definition)
    }

    /// Complete names currently in the dynamic table, in table order.
    #[cfg(test)]
    pub(crate) fn dynamic_names(&self) -> Vec<String> {
        let dynamic = self.dynamic.read().unwrap_or_else(PoisonError::into_inner);
        dynamic.iter().map(|(name, _)| name.clone()).collect()
    }
}
