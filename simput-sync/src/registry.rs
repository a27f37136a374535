//! Registry of data managers, one per remote session id.

use crate::manager::{DataManager, ManagerConfig};
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Owns the data managers of a process, keyed by session id.
///
/// Passed around explicitly; there is no global instance.
#[derive(Default)]
pub struct ManagerRegistry {
    managers: Mutex<HashMap<String, Arc<DataManager>>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn managers(&self) -> MutexGuard<'_, HashMap<String, Arc<DataManager>>> {
        self.managers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the manager for `id`, creating it when a transport is given.
    ///
    /// A new manager starts listening right away if a runtime is available.
    /// Without a transport and without an existing manager this returns
    /// `None`.
    pub fn get_or_create(
        &self,
        id: &str,
        config: ManagerConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Option<Arc<DataManager>> {
        let mut managers = self.managers();
        if let Some(existing) = managers.get(id) {
            return Some(Arc::clone(existing));
        }
        let Some(transport) = transport else {
            debug!("No manager for {} and no transport to create one", id);
            return None;
        };
        let manager = DataManager::new(id, config, transport);
        manager.listen();
        managers.insert(id.to_string(), Arc::clone(&manager));
        info!("Created data manager {}", id);
        Some(manager)
    }

    pub fn get(&self, id: &str) -> Option<Arc<DataManager>> {
        self.managers().get(id).cloned()
    }

    /// Forgets the manager for `id`. Its listener stops once the last
    /// reference is gone.
    pub fn remove(&self, id: &str) -> Option<Arc<DataManager>> {
        self.managers().remove(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.managers().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.managers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers().is_empty()
    }
}
