use super::descriptor::{ClassKey, ResourceClass};
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// Error raised by registry mutation.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("there is already a root resource class ({existing}) with path {template}")]
    DuplicateRootPath {
        template: String,
        existing: ClassKey,
        attempted: ClassKey,
    },
}

/// A consistent, immutable view of the attached root resources.
///
/// One snapshot is taken per resolution; attach/detach happening concurrently
/// never becomes partially visible mid-resolution.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    roots: Vec<Arc<ResourceClass>>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Arc<ResourceClass>> {
        self.roots.iter()
    }
}

/// The shared set of root resource descriptors.
///
/// Long-lived and mutable: `attach`/`detach` may run concurrently with
/// in-flight resolutions. Writers serialize on a mutex and publish a new
/// copy-on-write snapshot; readers take a lock-free `snapshot()`.
#[derive(Debug)]
pub struct CandidateRegistry {
    snapshot: ArcSwap<RegistrySnapshot>,
    write_lock: Mutex<()>,
}

impl CandidateRegistry {
    #[must_use]
    pub fn new() -> CandidateRegistry {
        CandidateRegistry {
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Attaches a root resource class.
    ///
    /// Re-attaching a class that is already present is a no-op. Attaching a
    /// *different* class at an already-registered template fails with
    /// [`RegistryError::DuplicateRootPath`].
    pub fn attach(&self, class: Arc<ResourceClass>) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.snapshot.load();
        for root in &current.roots {
            if root.key() == class.key() {
                debug!(class = %class.key(), "Root resource already attached, ignoring");
                return Ok(());
            }
            if root.pattern() == class.pattern() {
                return Err(RegistryError::DuplicateRootPath {
                    template: class.pattern().template().to_string(),
                    existing: root.key().clone(),
                    attempted: class.key().clone(),
                });
            }
        }
        let mut roots = current.roots.clone();
        info!(
            class = %class.key(),
            template = %class.pattern(),
            total = roots.len() + 1,
            "Attached root resource"
        );
        roots.push(class);
        self.snapshot.store(Arc::new(RegistrySnapshot { roots }));
        Ok(())
    }

    /// Detaches a root resource class by key. Returns whether it was present.
    pub fn detach(&self, key: &ClassKey) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.snapshot.load();
        let mut roots = current.roots.clone();
        let before = roots.len();
        roots.retain(|root| root.key() != key);
        if roots.len() == before {
            return false;
        }
        info!(class = %key, total = roots.len(), "Detached root resource");
        self.snapshot.store(Arc::new(RegistrySnapshot { roots }));
        true
    }

    /// Takes the current consistent view. The returned snapshot is frozen:
    /// later mutations are not visible through it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Prints the attached root templates, useful when debugging a routing
    /// table.
    pub fn dump(&self) {
        let snapshot = self.snapshot.load();
        println!("[roots] count={}", snapshot.len());
        for root in snapshot.roots() {
            println!("[root] {} -> {}", root.pattern(), root.key());
        }
    }
}

impl Default for CandidateRegistry {
    fn default() -> Self {
        CandidateRegistry::new()
    }
}
