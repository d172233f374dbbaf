//! Observer-side stand-ins for remote placement modules.

use std::collections::HashMap;

use level_math::Cell;
use tracing::debug;

use crate::actor::ActorType;
use crate::handle::MapHandle;
use crate::map_component::{MapComponent, ModuleSink};

/// Local copies of modules that live on the authoritative side.
///
/// Handles are the server's handles. A proxy is created the first time a cell
/// is pushed for a handle and keeps the last pushed cell after the module is
/// removed from the registry, until [`ProxyModules::detach`] drops it.
#[derive(Debug, Default)]
pub struct ProxyModules {
    modules: HashMap<MapHandle, MapComponent>,
}

impl ProxyModules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, handle: MapHandle) -> Option<&MapComponent> {
        self.modules.get(&handle)
    }

    /// Cached cell of the proxy, if one exists.
    #[must_use]
    pub fn cell(&self, handle: MapHandle) -> Option<Cell> {
        self.get(handle).map(MapComponent::cell)
    }

    /// Drops the proxy for a module that no longer exists remotely.
    pub fn detach(&mut self, handle: MapHandle) -> Option<MapComponent> {
        self.modules.remove(&handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MapHandle, &MapComponent)> + '_ {
        self.modules.iter().map(|(handle, module)| (*handle, module))
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

impl ModuleSink for ProxyModules {
    fn push_cell(&mut self, module: MapHandle, actor_type: ActorType, cell: Cell) {
        self.modules
            .entry(module)
            .and_modify(|proxy| proxy.set_cell(cell))
            .or_insert_with(|| {
                debug!(%module, %actor_type, %cell, "proxy module created");
                MapComponent::with_cell(cell, actor_type)
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_push_creates_proxy() {
        let mut proxies = ProxyModules::new();
        let h = MapHandle::from_raw_parts(3, 1);
        proxies.push_cell(h, ActorType::Player, Cell::from_xyz(200.0, 0.0, 0.0));

        let proxy = proxies.get(h).unwrap();
        assert_eq!(proxy.cell(), Cell::from_xyz(200.0, 0.0, 0.0));
        assert_eq!(proxy.actor_type(), ActorType::Player);
        assert_eq!(proxies.len(), 1);
    }

    #[test]
    fn test_later_push_overwrites_cell() {
        let mut proxies = ProxyModules::new();
        let h = MapHandle::from_raw_parts(0, 1);
        proxies.push_cell(h, ActorType::Box, Cell::ZERO);
        proxies.push_cell(h, ActorType::Box, Cell::from_xyz(0.0, 400.0, 0.0));
        assert_eq!(proxies.cell(h), Some(Cell::from_xyz(0.0, 400.0, 0.0)));
        assert_eq!(proxies.len(), 1);
    }

    #[test]
    fn test_detach() {
        let mut proxies = ProxyModules::new();
        let h = MapHandle::from_raw_parts(0, 1);
        proxies.push_cell(h, ActorType::Bomb, Cell::ZERO);
        assert!(proxies.detach(h).is_some());
        assert!(proxies.is_empty());
        assert!(proxies.cell(h).is_none());
    }
}
