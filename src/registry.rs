//! Per-project object registry
//!
//! Steps that create or look up configurator objects register them under a
//! symbolic name; later steps reference those names. The registry maps each
//! name to a tagged handle so that a step asking for a thread cannot
//! silently receive a module, and a missing name surfaces as a typed
//! lookup error instead of a crash.
//!
//! A registry lives exactly as long as one project's sequence. Names are
//! never garbage-collected; only `delete_stack` removes an entry.

use std::collections::HashMap;

use strum::Display;
use thiserror::Error;

use crate::bridge::Handle;

/// What kind of configurator object a registered name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ObjectKind {
    Thread,
    Module,
    Property,
    #[strum(serialize = "rtos object")]
    RtosObject,
}

/// A registered configurator object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    pub handle: Handle,
}

/// Typed lookup failures. These are recorded in the batch report; they do
/// not abort a sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no object registered under '{0}'")]
    NotFound(String),

    #[error("'{name}' is a {actual}, expected a {expected}")]
    KindMismatch {
        name: String,
        expected: ObjectKind,
        actual: ObjectKind,
    },
}

/// Mapping from symbolic names to live configurator handles.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: HashMap<String, Object>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `name`, replacing any previous entry (the
    /// batch format allows rebinding a name).
    pub fn register(&mut self, name: &str, kind: ObjectKind, handle: Handle) {
        self.objects
            .insert(name.to_string(), Object { kind, handle });
    }

    /// Remove a name, returning the object it referred to.
    pub fn remove(&mut self, name: &str) -> Option<Object> {
        self.objects.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Look up a name regardless of kind. Used where the batch format
    /// accepts any object (e.g. `module_or_thread`).
    pub fn any(&self, name: &str) -> Result<Object, LookupError> {
        self.objects
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }

    fn of_kind(&self, name: &str, expected: ObjectKind) -> Result<Handle, LookupError> {
        let object = self.any(name)?;
        if object.kind == expected {
            Ok(object.handle)
        } else {
            Err(LookupError::KindMismatch {
                name: name.to_string(),
                expected,
                actual: object.kind,
            })
        }
    }

    pub fn thread(&self, name: &str) -> Result<Handle, LookupError> {
        self.of_kind(name, ObjectKind::Thread)
    }

    pub fn module(&self, name: &str) -> Result<Handle, LookupError> {
        self.of_kind(name, ObjectKind::Module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let mut registry = ObjectRegistry::new();
        registry.register("t0", ObjectKind::Thread, Handle::new(1));
        registry.register("mod0", ObjectKind::Module, Handle::new(2));

        assert_eq!(registry.thread("t0").unwrap(), Handle::new(1));
        assert_eq!(registry.module("mod0").unwrap(), Handle::new(2));

        assert_eq!(
            registry.thread("mod0"),
            Err(LookupError::KindMismatch {
                name: "mod0".to_string(),
                expected: ObjectKind::Thread,
                actual: ObjectKind::Module,
            })
        );
        assert_eq!(
            registry.module("missing"),
            Err(LookupError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_remove_unregisters() {
        let mut registry = ObjectRegistry::new();
        registry.register("stack0", ObjectKind::Module, Handle::new(7));
        assert!(registry.contains("stack0"));

        let removed = registry.remove("stack0").unwrap();
        assert_eq!(removed.handle, Handle::new(7));
        assert!(!registry.contains("stack0"));
        assert!(matches!(
            registry.module("stack0"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_rebinding_replaces() {
        let mut registry = ObjectRegistry::new();
        registry.register("x", ObjectKind::Thread, Handle::new(1));
        registry.register("x", ObjectKind::Module, Handle::new(2));
        assert_eq!(registry.module("x").unwrap(), Handle::new(2));
    }
}
