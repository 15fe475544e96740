use super::{CraftClassifier, ModelError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Process-wide holder for the single classifier instance.
#[derive(Default)]
pub struct ModelRegistry {
    slot: Mutex<Option<Arc<CraftClassifier>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a model already constructed and loaded.
    pub fn preloaded() -> Self {
        let registry = Self::new();
        registry.load_model();
        registry
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<CraftClassifier>>> {
        // The slot is only ever replaced whole, so a poisoned lock still holds a valid value.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Constructs and loads the model on first call; later calls return the same instance.
    pub fn load_model(&self) -> Arc<CraftClassifier> {
        let mut slot = self.slot();
        if let Some(model) = slot.as_ref() {
            return Arc::clone(model);
        }
        let mut model = CraftClassifier::new();
        model.load();
        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        model
    }

    pub fn get_model(&self) -> Result<Arc<CraftClassifier>, ModelError> {
        self.slot().as_ref().map(Arc::clone).ok_or(ModelError::NotLoaded)
    }

    /// Discards the current instance and constructs a fresh one.
    #[allow(dead_code)]
    pub fn reload_model(&self) -> Arc<CraftClassifier> {
        log::info!("Reloading craft model");
        self.slot().take();
        self.load_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn get_before_load_fails() {
        let registry = ModelRegistry::new();
        assert!(matches!(registry.get_model(), Err(ModelError::NotLoaded)));
    }

    #[test]
    fn load_is_memoized() {
        let registry = ModelRegistry::new();
        let first = registry.load_model();
        let second = registry.load_model();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_loaded());
        assert!(Arc::ptr_eq(&first, &registry.get_model().unwrap()));
    }

    #[test]
    fn reload_replaces_instance_with_same_info() {
        let registry = ModelRegistry::preloaded();
        let before = registry.get_model().unwrap();
        registry.reload_model();
        let after = registry.get_model().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.info(), after.info());
    }

    #[test]
    fn concurrent_cold_loads_share_one_instance() {
        let registry = Arc::new(ModelRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.load_model())
            })
            .collect();
        let models: Vec<Arc<CraftClassifier>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let current = registry.get_model().unwrap();
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &current)));
    }
}
