//! Iteration over registered modules.

use std::iter::FusedIterator;
use std::slice;

use level_component::MapHandle;

use crate::entry::RegistryEntry;

/// Yields the module handle of each entry, in registry order.
///
/// Shared by [`MapRegistry`](crate::MapRegistry) and
/// [`RegistryReplica`](crate::RegistryReplica).
#[derive(Debug, Clone)]
pub struct ModuleIter<'a> {
    entries: slice::Iter<'a, RegistryEntry>,
}

impl<'a> ModuleIter<'a> {
    pub(crate) fn new(entries: &'a [RegistryEntry]) -> Self {
        Self {
            entries: entries.iter(),
        }
    }
}

impl Iterator for ModuleIter<'_> {
    type Item = MapHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(RegistryEntry::module)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl DoubleEndedIterator for ModuleIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back().map(RegistryEntry::module)
    }
}

impl ExactSizeIterator for ModuleIter<'_> {}

impl FusedIterator for ModuleIter<'_> {}
