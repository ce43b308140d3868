//! Entity prototypes keyed by name.

use crate::error::{OrmError, OrmResult};
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

/// A record type managed by a repository.
///
/// Entities carry an integer id once persisted.
pub trait Entity: Send + Sync + 'static {
    /// The persisted id, or `None` for an entity that was never stored.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);
}

trait Prototype: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_entity(&self) -> Box<dyn Entity>;
    fn type_name(&self) -> &'static str;
}

impl<T: Entity + Clone> Prototype for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_entity(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Registry of entity prototypes.
///
/// Each name maps to one prototype; [`EntityRegistry::create`] hands out
/// independent copies of it. Build the registry at startup, then share it
/// behind an `Arc`.
///
/// ```rust
/// use repoman::{Entity, EntityRegistry};
///
/// #[derive(Clone, Default)]
/// struct User { id: Option<i64>, name: String }
///
/// impl Entity for User {
///     fn id(&self) -> Option<i64> { self.id }
///     fn set_id(&mut self, id: i64) { self.id = Some(id); }
/// }
///
/// let mut registry = EntityRegistry::new();
/// registry.register("users", User::default()).unwrap();
/// let user: User = registry.create("users").unwrap();
/// assert!(user.id.is_none());
/// assert!(registry.register("users", User::default()).is_err());
/// ```
#[derive(Default)]
pub struct EntityRegistry {
    prototypes: HashMap<String, Box<dyn Prototype>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `prototype` under `name`.
    ///
    /// Fails with [`OrmError::EntityAlreadyRegistered`] if the name is taken;
    /// the existing prototype is kept.
    pub fn register<T: Entity + Clone>(&mut self, name: &str, prototype: T) -> OrmResult<()> {
        if self.prototypes.contains_key(name) {
            return Err(OrmError::EntityAlreadyRegistered(name.to_string()));
        }
        self.prototypes.insert(name.to_string(), Box::new(prototype));
        Ok(())
    }

    /// A fresh copy of the prototype registered under `name`.
    pub fn create<T: Entity + Clone>(&self, name: &str) -> OrmResult<T> {
        let prototype = self.prototype(name)?;
        prototype
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| OrmError::EntityType {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Like [`EntityRegistry::create`] without knowing the concrete type.
    pub fn create_dyn(&self, name: &str) -> OrmResult<Box<dyn Entity>> {
        Ok(self.prototype(name)?.clone_entity())
    }

    /// Fail with [`OrmError::EntityNotRegistered`] unless `name` is registered.
    pub fn ensure_registered(&self, name: &str) -> OrmResult<()> {
        self.prototype(name).map(|_| ())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prototypes.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.prototypes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    fn prototype(&self, name: &str) -> OrmResult<&dyn Prototype> {
        self.prototypes
            .get(name)
            .map(|p| &**p)
            .ok_or_else(|| OrmError::EntityNotRegistered(name.to_string()))
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&str, &str)> = self
            .prototypes
            .iter()
            .map(|(name, p)| (name.as_str(), p.type_name()))
            .collect();
        entries.sort_unstable();
        f.debug_map().entries(entries).finish()
    }
}
