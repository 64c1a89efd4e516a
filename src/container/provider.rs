//! Scoped instance providers.
//!
//! Recursive instruction processing needs "the current X" - current
//! renderable, current target node, current instruction - without
//! threading each through every call. A [`InstanceProvider`] holds exactly
//! one current value, installed into a render context's container for one
//! component operation at a time. It is container-scoped, not global:
//! independent render contexts own independent providers and never
//! interfere.
//!
//! Unset and prepared-empty are different states. Resolving while unset is
//! a programming-contract violation and fails fatally; resolving a
//! provider that was explicitly prepared with the empty sentinel is valid
//! and returns the sentinel.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::container::{Container, Resolved, Resolver};
use crate::definition::TemplateDefinition;
use crate::engine::RenderingEngine;
use crate::error::{Error, Result};
use crate::view::ViewFactory;

/// Replaceable-part overrides: part name to replacement definition.
pub type PartsMap = HashMap<String, Rc<TemplateDefinition>>;

// =============================================================================
// Instance Provider
// =============================================================================

enum ProviderState<T> {
    /// Never prepared. Resolution is a contract violation.
    Unset,
    /// Prepared; `None` is the explicit empty sentinel.
    Prepared(Option<Rc<T>>),
}

/// Holds the single "current" value of one kind for one render context.
pub struct InstanceProvider<T> {
    state: RefCell<ProviderState<T>>,
}

impl<T> InstanceProvider<T> {
    /// Create an unset provider.
    pub fn new() -> Self {
        InstanceProvider {
            state: RefCell::new(ProviderState::Unset),
        }
    }

    /// Install the current value. `None` is the explicit empty sentinel.
    pub fn prepare(&self, instance: Option<Rc<T>>) {
        *self.state.borrow_mut() = ProviderState::Prepared(instance);
    }

    /// Whether any `prepare` call is in effect.
    pub fn is_prepared(&self) -> bool {
        matches!(&*self.state.borrow(), ProviderState::Prepared(_))
    }

    /// The current value. Fatal if never prepared.
    pub fn resolve(&self) -> Result<Option<Rc<T>>> {
        match &*self.state.borrow() {
            ProviderState::Unset => Err(Error::ProviderNotPrepared),
            ProviderState::Prepared(instance) => Ok(instance.clone()),
        }
    }

    /// Clear back to unset.
    pub fn dispose(&self) {
        *self.state.borrow_mut() = ProviderState::Unset;
    }
}

impl<T> Default for InstanceProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Resolver for InstanceProvider<T> {
    fn resolve(&self, _container: &Container) -> Result<Resolved> {
        let instance = InstanceProvider::resolve(self)?;
        Ok(Rc::new(instance) as Resolved)
    }
}

// =============================================================================
// View Factory Provider
// =============================================================================

enum FactoryState {
    Unset,
    Prepared {
        factory: Rc<ViewFactory>,
        replacements: PartsMap,
    },
}

/// Specialized provider for the current view factory.
///
/// Carries the default factory plus the replaceable-part map. Resolution
/// checks the map for the factory's name first: a replacement definition
/// wins, and is built through the rendering engine so part overrides share
/// the same single-compile-per-definition cache as top-level templates.
pub struct ViewFactoryProvider {
    engine: Weak<RenderingEngine>,
    state: RefCell<FactoryState>,
}

impl ViewFactoryProvider {
    /// Create an unset provider bound to an engine.
    pub fn new(engine: Weak<RenderingEngine>) -> Self {
        ViewFactoryProvider {
            engine,
            state: RefCell::new(FactoryState::Unset),
        }
    }

    /// Install the default factory and the replacement map for one
    /// component operation.
    pub fn prepare(&self, factory: Rc<ViewFactory>, replacements: PartsMap) {
        *self.state.borrow_mut() = FactoryState::Prepared {
            factory,
            replacements,
        };
    }

    /// Whether any `prepare` call is in effect.
    pub fn is_prepared(&self) -> bool {
        matches!(&*self.state.borrow(), FactoryState::Prepared { .. })
    }

    /// Resolve the effective factory for the requesting scope.
    pub fn resolve(&self, requesting: &Container) -> Result<Rc<ViewFactory>> {
        let (factory, replacement) = match &*self.state.borrow() {
            FactoryState::Unset => return Err(Error::ProviderNotPrepared),
            FactoryState::Prepared {
                factory,
                replacements,
            } => {
                if factory.name().is_empty() {
                    return Err(Error::UnnamedViewFactory);
                }
                (factory.clone(), replacements.get(factory.name()).cloned())
            }
        };

        match replacement {
            Some(definition) => {
                let engine = self.engine.upgrade().ok_or(Error::EngineReleased)?;
                engine.view_factory_for(&definition, Some(requesting))
            }
            None => Ok(factory),
        }
    }

    /// Clear back to unset.
    pub fn dispose(&self) {
        *self.state.borrow_mut() = FactoryState::Unset;
    }
}

impl Resolver for ViewFactoryProvider {
    fn resolve(&self, container: &Container) -> Result<Resolved> {
        let factory = ViewFactoryProvider::resolve(self, container)?;
        Ok(factory as Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_before_prepare_is_fatal() {
        let provider: InstanceProvider<u32> = InstanceProvider::new();
        assert!(matches!(
            provider.resolve(),
            Err(Error::ProviderNotPrepared)
        ));
    }

    #[test]
    fn test_prepare_resolve_roundtrip() {
        let provider: InstanceProvider<u32> = InstanceProvider::new();
        let value = Rc::new(7u32);

        provider.prepare(Some(value.clone()));
        let resolved = provider.resolve().unwrap().unwrap();
        assert!(Rc::ptr_eq(&resolved, &value));
    }

    #[test]
    fn test_prepared_empty_is_valid() {
        let provider: InstanceProvider<u32> = InstanceProvider::new();
        provider.prepare(None);

        assert!(provider.is_prepared());
        assert!(provider.resolve().unwrap().is_none());
    }

    #[test]
    fn test_dispose_returns_to_unset() {
        let provider: InstanceProvider<u32> = InstanceProvider::new();
        provider.prepare(Some(Rc::new(1)));
        provider.dispose();

        assert!(!provider.is_prepared());
        assert!(matches!(
            provider.resolve(),
            Err(Error::ProviderNotPrepared)
        ));
    }

    #[test]
    fn test_resolver_impl_exposes_current_value() {
        let provider: Rc<InstanceProvider<u32>> = Rc::new(InstanceProvider::new());
        provider.prepare(Some(Rc::new(9)));

        let container = Container::root();
        let resolved = Resolver::resolve(provider.as_ref(), &container).unwrap();
        let value = resolved.downcast::<Option<Rc<u32>>>().unwrap();
        assert_eq!(**value.as_ref().unwrap(), 9);
    }

    #[test]
    fn test_factory_provider_unset_is_fatal() {
        let provider = ViewFactoryProvider::new(Weak::new());
        let container = Container::root();
        assert!(matches!(
            provider.resolve(&container),
            Err(Error::ProviderNotPrepared)
        ));
    }
}
