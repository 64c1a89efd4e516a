//! Read-only resource lookup for compilers.
//!
//! A compiler reasoning about a template needs to know which custom
//! elements, attributes, and value converters are in scope - without
//! triggering eager instantiation of any of them. [`ResourceDescriptions`]
//! is that window: a thin adapter over a resolution container exposing
//! descriptions and locally-registered instances, nothing else.

use std::rc::Rc;

use crate::component::{Component, ComponentType, ResourceKind};
use crate::container::Container;

/// Read-only view of a resolution scope's registered resources.
pub struct ResourceDescriptions<'a> {
    context: &'a Container,
}

impl<'a> ResourceDescriptions<'a> {
    /// Adapt a container.
    pub fn new(context: &'a Container) -> Self {
        ResourceDescriptions { context }
    }

    /// Look up a registered resource's description without instantiating
    /// it. Walks ancestor scopes; `None` if absent at any step.
    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<Rc<ComponentType>> {
        self.context.find_resource(kind, name, true)
    }

    /// Instantiate a resource only if it is registered in the local scope.
    /// Does not fall back to ancestors.
    pub fn create(&self, kind: ResourceKind, name: &str) -> Option<Box<dyn Component>> {
        self.context
            .find_resource(kind, name, false)
            .map(|ty| (ty.construct)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Component for Plain {}

    fn plain_type(name: &str) -> Rc<ComponentType> {
        Rc::new(ComponentType::element(
            name,
            Rc::new(|| Box::new(Plain) as Box<dyn Component>),
        ))
    }

    #[test]
    fn test_find_walks_ancestors() {
        let root = Container::root();
        root.register_resource(plain_type("panel"));
        let child = root.create_child();

        let resources = ResourceDescriptions::new(&child);
        let found = resources.find(ResourceKind::Element, "panel").unwrap();
        assert_eq!(found.name, "panel");
    }

    #[test]
    fn test_find_absent_is_none() {
        let root = Container::root();
        let resources = ResourceDescriptions::new(&root);
        assert!(resources.find(ResourceKind::Element, "ghost").is_none());
    }

    #[test]
    fn test_create_is_local_only() {
        let root = Container::root();
        root.register_resource(plain_type("panel"));
        let child = root.create_child();

        // Registered in an ancestor: find sees it, create does not.
        let resources = ResourceDescriptions::new(&child);
        assert!(resources.find(ResourceKind::Element, "panel").is_some());
        assert!(resources.create(ResourceKind::Element, "panel").is_none());

        child.register_resource(plain_type("panel"));
        assert!(resources.create(ResourceKind::Element, "panel").is_some());
    }
}
