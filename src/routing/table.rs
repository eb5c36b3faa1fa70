//! Ordered route table

use super::entry::RouteEntry;

/// Routes in registration order
///
/// Lookups walk the table newest-first, so a route registered later
/// overrides an earlier, more general one.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn append(&mut self, entry: RouteEntry) {
        self.entries.push(entry);
    }

    /// Take every entry out, leaving the table empty
    pub fn drain(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Append all of `other` after the existing entries
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in dispatch order: most recently registered first
    pub fn by_priority(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::entry::{handler, MethodFilter};
    use crate::routing::scope::Scope;

    fn entry(pattern: &str) -> RouteEntry {
        RouteEntry::new(MethodFilter::Any, pattern, handler(|_, _| Ok(())), &Scope::new()).unwrap()
    }

    #[test]
    fn test_priority_is_reverse_registration() {
        let mut table = RouteTable::new();
        table.append(entry("^/a$"));
        table.append(entry("^/b$"));
        table.append(entry("^/c$"));

        let order: Vec<&str> = table.by_priority().map(RouteEntry::pattern).collect();
        assert_eq!(order, ["^/c$", "^/b$", "^/a$"]);
    }

    #[test]
    fn test_drain_empties_table() {
        let mut table = RouteTable::new();
        table.append(entry("^/a$"));

        let drained = table.drain();
        assert!(table.is_empty());
        assert_eq!(drained.len(), 1);

        let mut merged = RouteTable::new();
        merged.append(entry("^/x$"));
        merged.extend(drained);
        assert_eq!(merged.by_priority().next().map(RouteEntry::pattern), Some("^/a$"));
    }
}
