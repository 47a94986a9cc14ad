//! Attribution of report entries to engine components.
//!
//! The render thread only ever hands over a [`ComponentId`]. Names are
//! resolved on the drain worker, and a component that no longer exists
//! resolves to [`UNKNOWN_COMPONENT`].

use core::sync::atomic::{AtomicU64, Ordering};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// Display string for components that cannot be resolved.
pub const UNKNOWN_COMPONENT: &str = "unknown";

static COMPONENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque, non-owning handle to the component that produced an entry.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl ComponentId {
    /// Allocate a new process-unique id.
    pub fn generate() -> Self {
        Self(COMPONENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Interned name of a control or other engine object.
///
/// Cloning only bumps a reference count, so identifiers can be attached to
/// entries on the render thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves component handles to display names.
pub trait ComponentNames: Send + Sync {
    /// `None` when the component is gone or was never registered.
    fn component_name(&self, id: ComponentId) -> Option<String>;

    /// Name for display, degrading to [`UNKNOWN_COMPONENT`].
    fn display_name(&self, id: ComponentId) -> Cow<'static, str> {
        match self.component_name(id) {
            Some(name) => Cow::Owned(name),
            None => Cow::Borrowed(UNKNOWN_COMPONENT),
        }
    }
}

/// Concurrent id → name table maintained by the engine.
///
/// Components register when created and unregister when destroyed; entries
/// that outlive their component then print as `unknown`.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    names: DashMap<ComponentId, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named component under a fresh id.
    pub fn register(&self, name: impl Into<String>) -> ComponentId {
        let id = ComponentId::generate();
        self.names.insert(id, name.into());
        id
    }

    /// Register or rename a component under an engine-chosen id.
    pub fn insert(&self, id: ComponentId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn unregister(&self, id: ComponentId) -> Option<String> {
        self.names.remove(&id).map(|(_, name)| name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ComponentNames for ComponentRegistry {
    fn component_name(&self, id: ComponentId) -> Option<String> {
        self.names.get(&id).map(|entry| entry.value().clone())
    }
}
