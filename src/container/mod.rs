//! Hierarchical dependency-resolution containers.
//!
//! A [`Container`] is a node in a resolution tree: lookups consult the
//! local registrations first, then walk ancestors unless asked to stay
//! local. Child containers are cheap to create, so contexts mirror the
//! component hierarchy - one child per compiled template, rooted at the
//! application container.
//!
//! Registration is keyed. A key's first registration becomes its default;
//! a later registration overrides it, and [`Container::restore_default`]
//! puts the default back. This is what lets per-instantiation "current X"
//! resolvers be installed temporarily without losing whatever the
//! application registered underneath.
//!
//! Resources (custom elements, attributes, value converters) register
//! their [`ComponentType`] descriptors here; [`Container::find_resource`]
//! peeks at the descriptor without instantiating anything.

pub mod provider;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::component::{ComponentType, ResourceKind};
use crate::error::{Error, Result};

// =============================================================================
// Keys
// =============================================================================

/// Registration key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// The renderable currently under construction.
    Renderable,
    /// The node currently being processed.
    TargetNode,
    /// The instruction currently being applied.
    Instruction,
    /// The render location for the view being stamped out.
    RenderLocation,
    /// The view factory for the template being hydrated.
    ViewFactory,
    /// A registered resource, by kind and name.
    Resource(ResourceKind, String),
    /// An application-defined registration.
    Named(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Renderable => write!(f, "current-renderable"),
            Key::TargetNode => write!(f, "current-target"),
            Key::Instruction => write!(f, "current-instruction"),
            Key::RenderLocation => write!(f, "current-render-location"),
            Key::ViewFactory => write!(f, "current-view-factory"),
            Key::Resource(kind, name) => write!(f, "{} '{}'", kind, name),
            Key::Named(name) => write!(f, "'{}'", name),
        }
    }
}

// =============================================================================
// Resolvers
// =============================================================================

/// What a resolver hands back: a shared, dynamically-typed value.
pub type Resolved = Rc<dyn Any>;

/// Produces a value for a key at resolution time.
pub trait Resolver {
    /// Resolve the value. `container` is the scope the lookup started in.
    fn resolve(&self, container: &Container) -> Result<Resolved>;

    /// Peek at resource metadata without instantiating. `None` for
    /// resolvers that do not describe a resource.
    fn component_type(&self) -> Option<Rc<ComponentType>> {
        None
    }
}

/// Resolver holding a pre-built shared value.
struct InstanceResolver {
    value: Resolved,
}

impl Resolver for InstanceResolver {
    fn resolve(&self, _container: &Container) -> Result<Resolved> {
        Ok(self.value.clone())
    }
}

/// Resolver for a registered resource: resolves to its type descriptor.
struct ResourceResolver {
    ty: Rc<ComponentType>,
}

impl Resolver for ResourceResolver {
    fn resolve(&self, _container: &Container) -> Result<Resolved> {
        Ok(self.ty.clone())
    }

    fn component_type(&self) -> Option<Rc<ComponentType>> {
        Some(self.ty.clone())
    }
}

// =============================================================================
// Bulk Registration
// =============================================================================

/// Anything that can register itself into a container.
pub trait Registry {
    fn register(&self, container: &Container);
}

impl Registry for Rc<ComponentType> {
    fn register(&self, container: &Container) {
        container.register_resource(self.clone());
    }
}

// =============================================================================
// Container
// =============================================================================

struct ContainerInner {
    parent: Option<Container>,
    resolvers: RefCell<HashMap<Key, Rc<dyn Resolver>>>,
    /// First registration per key, kept for restore-to-default.
    defaults: RefCell<HashMap<Key, Rc<dyn Resolver>>>,
}

/// A node in the resolution tree. Cheap to clone (shared handle).
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    /// Create a root container.
    pub fn root() -> Self {
        Container {
            inner: Rc::new(ContainerInner {
                parent: None,
                resolvers: RefCell::new(HashMap::new()),
                defaults: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Derive a child scope.
    pub fn create_child(&self) -> Self {
        Container {
            inner: Rc::new(ContainerInner {
                parent: Some(self.clone()),
                resolvers: RefCell::new(HashMap::new()),
                defaults: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Whether two handles point at the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a resolver under a key.
    ///
    /// The first registration for a key becomes its default; overriding
    /// registrations can be undone with [`Container::restore_default`].
    pub fn register_resolver(&self, key: Key, resolver: Rc<dyn Resolver>) {
        let mut resolvers = self.inner.resolvers.borrow_mut();
        if let Some(existing) = resolvers.get(&key) {
            self.inner
                .defaults
                .borrow_mut()
                .entry(key.clone())
                .or_insert_with(|| existing.clone());
        }
        resolvers.insert(key, resolver);
    }

    /// Restore a key to its default resolver.
    ///
    /// Returns false if the key was never overridden; if it has no default
    /// either, the key becomes unregistered.
    pub fn restore_default(&self, key: &Key) -> bool {
        let default = self.inner.defaults.borrow_mut().remove(key);
        match default {
            Some(resolver) => {
                self.inner.resolvers.borrow_mut().insert(key.clone(), resolver);
                true
            }
            None => false,
        }
    }

    /// Register a shared instance under a key.
    pub fn register_instance(&self, key: Key, value: Resolved) {
        self.register_resolver(key, Rc::new(InstanceResolver { value }));
    }

    /// Register a resource type under its kind/name key.
    pub fn register_resource(&self, ty: Rc<ComponentType>) {
        let key = Key::Resource(ty.kind, ty.name.clone());
        self.register_resolver(key, Rc::new(ResourceResolver { ty }));
    }

    /// Register everything a registry carries.
    pub fn register(&self, registry: &dyn Registry) {
        registry.register(self);
    }

    /// Look up the resolver for a key, optionally walking ancestors.
    fn resolver(&self, key: &Key, search_ancestors: bool) -> Option<Rc<dyn Resolver>> {
        let mut current = Some(self.clone());
        while let Some(container) = current {
            if let Some(resolver) = container.inner.resolvers.borrow().get(key) {
                return Some(resolver.clone());
            }
            if !search_ancestors {
                return None;
            }
            current = container.inner.parent.clone();
        }
        None
    }

    /// Resolve a key, walking ancestors. Unregistered keys are fatal.
    pub fn get(&self, key: &Key) -> Result<Resolved> {
        match self.resolver(key, true) {
            Some(resolver) => resolver.resolve(self),
            None => Err(Error::UnknownKey(key.to_string())),
        }
    }

    /// Whether a key is registered.
    pub fn has(&self, key: &Key, search_ancestors: bool) -> bool {
        self.resolver(key, search_ancestors).is_some()
    }

    /// Peek at a registered resource's type descriptor without
    /// instantiating it.
    pub fn find_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        search_ancestors: bool,
    ) -> Option<Rc<ComponentType>> {
        self.resolver(&Key::Resource(kind, name.to_string()), search_ancestors)
            .and_then(|resolver| resolver.component_type())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.inner.resolvers.borrow().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
