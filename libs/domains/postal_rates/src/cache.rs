use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{TariffId, CATALOG};
use crate::source::TableLoadError;
use crate::tariff::TariffTable;

/// Write-once cache of loaded tariff tables.
///
/// Only successful loads are stored. A failed load leaves the slot empty so
/// the next request retries it.
#[derive(Debug)]
pub struct TariffCache {
    slots: HashMap<TariffId, OnceCell<Arc<TariffTable>>>,
}

impl TariffCache {
    pub fn new(ids: impl IntoIterator<Item = TariffId>) -> Self {
        Self {
            slots: ids.into_iter().map(|id| (id, OnceCell::new())).collect(),
        }
    }

    /// One slot per catalog product
    pub fn for_catalog() -> Self {
        Self::new(CATALOG.iter().map(|spec| spec.tariff_id))
    }

    /// Cached table for `id`, running `load` if it is not cached yet
    pub fn get_or_load<F>(&self, id: TariffId, load: F) -> Result<Arc<TariffTable>, TableLoadError>
    where
        F: FnOnce() -> Result<TariffTable, TableLoadError>,
    {
        let slot = self
            .slots
            .get(&id)
            .ok_or_else(|| TableLoadError::UnknownTable(id.to_string()))?;
        slot.get_or_try_init(|| load().map(Arc::new)).cloned()
    }

    pub fn is_loaded(&self, id: TariffId) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.get().is_some())
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.values().filter(|slot| slot.get().is_some()).count()
    }
}
