//! Component types and live instances.
//!
//! A [`ComponentType`] is the per-type descriptor the runtime works from:
//! resource kind and name, the optional view definition, declared bindable
//! properties, lifecycle-hook presence flags, and a constructor for the
//! user-defined component logic. Types register into resolution containers
//! as resources; templates declare the types they depend on.
//!
//! A [`ComponentElement`] is one live instance: the constructed
//! [`Component`], the bindable signal table the runtime behavior installs,
//! and the renderable [`RenderState`]. Elements participate in both
//! lifecycle lists and run their hooks around their children's passes.

pub mod behavior;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use spark_signals::{signal, Signal};

use crate::definition::TemplateDefinition;
use crate::lifecycle::{Attachable, Bindable, RenderState, Scope};
use crate::types::Value;

// =============================================================================
// Resource Kind
// =============================================================================

/// What kind of resource a component type is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Custom element: has a view, projects nodes.
    Element,
    /// Custom attribute: behavior on an existing node, no view of its own.
    Attribute,
    /// Value converter used by binding expressions.
    ValueConverter,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Element => "custom-element",
            ResourceKind::Attribute => "custom-attribute",
            ResourceKind::ValueConverter => "value-converter",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Behavior Flags
// =============================================================================

bitflags! {
    /// Which lifecycle hooks a component type implements.
    ///
    /// Derived once per type and applied to every instance, so the
    /// lifecycle passes skip hook calls the type never wrote.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BehaviorFlags: u16 {
        const HAS_CREATED   = 1 << 0;
        const HAS_BINDING   = 1 << 1;
        const HAS_BOUND     = 1 << 2;
        const HAS_UNBINDING = 1 << 3;
        const HAS_ATTACHING = 1 << 4;
        const HAS_ATTACHED  = 1 << 5;
        const HAS_DETACHING = 1 << 6;
    }
}

// =============================================================================
// Component Trait
// =============================================================================

/// User-defined component logic with optional lifecycle hooks.
///
/// Hooks with no work should stay unimplemented and unflagged - the
/// runtime consults [`BehaviorFlags`] before calling.
pub trait Component {
    /// After hydration: nodes exist, properties are set, nothing is bound.
    fn created(&mut self) {}
    /// Before this component's subtree binds.
    fn binding(&mut self) {}
    /// After this component's subtree has bound.
    fn bound(&mut self, _scope: &Scope) {}
    /// Before this component's subtree unbinds.
    fn unbinding(&mut self) {}
    /// Before this component's subtree attaches.
    fn attaching(&mut self) {}
    /// After this component's subtree has attached.
    fn attached(&mut self) {}
    /// Before this component's subtree detaches.
    fn detaching(&mut self) {}
}

/// Constructor for a component type's logic object.
pub type ComponentConstructor = Rc<dyn Fn() -> Box<dyn Component>>;

// =============================================================================
// Bindable Declarations
// =============================================================================

/// A declared bindable property.
#[derive(Debug, Clone, PartialEq)]
pub struct BindableDef {
    /// Property name instructions address.
    pub property: String,
    /// Initial value installed with the property's signal.
    pub default: Value,
}

impl BindableDef {
    /// Declare a bindable property with a default value.
    pub fn new(property: &str, default: impl Into<Value>) -> Self {
        BindableDef {
            property: property.to_string(),
            default: default.into(),
        }
    }
}

// =============================================================================
// Type Key
// =============================================================================

/// Stable opaque identity of a component type. The behavior-cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey(u64);

thread_local! {
    /// Counter for assigning type keys.
    static NEXT_TYPE_KEY: Cell<u64> = const { Cell::new(0) };
}

impl TypeKey {
    fn next() -> Self {
        NEXT_TYPE_KEY.with(|next| {
            let key = next.get();
            next.set(key + 1);
            TypeKey(key)
        })
    }
}

// =============================================================================
// Component Type
// =============================================================================

/// Per-type descriptor: everything the runtime needs to construct and
/// activate instances of one component.
pub struct ComponentType {
    key: TypeKey,
    /// Resource name, as templates refer to it.
    pub name: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// View definition for elements; `None` for logic-only components.
    pub definition: Option<Rc<TemplateDefinition>>,
    /// Declared bindable properties.
    pub bindables: Vec<BindableDef>,
    /// Lifecycle hooks the type implements.
    pub flags: BehaviorFlags,
    /// Constructor for the component logic.
    pub construct: ComponentConstructor,
}

impl ComponentType {
    /// Describe a custom element.
    pub fn element(name: &str, construct: ComponentConstructor) -> Self {
        Self::new(name, ResourceKind::Element, construct)
    }

    /// Describe a custom attribute.
    pub fn attribute(name: &str, construct: ComponentConstructor) -> Self {
        Self::new(name, ResourceKind::Attribute, construct)
    }

    fn new(name: &str, kind: ResourceKind, construct: ComponentConstructor) -> Self {
        ComponentType {
            key: TypeKey::next(),
            name: name.to_string(),
            kind,
            definition: None,
            bindables: Vec::new(),
            flags: BehaviorFlags::empty(),
            construct,
        }
    }

    /// Attach the view definition.
    pub fn with_definition(mut self, definition: Rc<TemplateDefinition>) -> Self {
        self.definition = Some(definition);
        self
    }

    /// Declare a bindable property.
    pub fn with_bindable(mut self, property: &str, default: impl Into<Value>) -> Self {
        self.bindables.push(BindableDef::new(property, default));
        self
    }

    /// Declare implemented lifecycle hooks.
    pub fn with_flags(mut self, flags: BehaviorFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// The type's stable identity.
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("bindables", &self.bindables.len())
            .finish()
    }
}

// =============================================================================
// Component Element (live instance)
// =============================================================================

/// One live component instance.
///
/// Carries the user logic, the bindable signal table (installed by the
/// type's runtime behavior), and the renderable state. Hook calls are
/// gated by the instance's applied flags, so an instance that never had
/// behavior applied runs no hooks.
pub struct ComponentElement {
    ty: Rc<ComponentType>,
    component: RefCell<Box<dyn Component>>,
    bindables: RefCell<HashMap<String, Signal<Value>>>,
    flags: Cell<BehaviorFlags>,
    state: Rc<RenderState>,
}

impl ComponentElement {
    /// Construct an instance of a type. Runtime behavior is applied
    /// separately (by the rendering engine).
    pub fn new(ty: &Rc<ComponentType>) -> Rc<Self> {
        Rc::new(ComponentElement {
            ty: ty.clone(),
            component: RefCell::new((ty.construct)()),
            bindables: RefCell::new(HashMap::new()),
            flags: Cell::new(BehaviorFlags::empty()),
            state: RenderState::new(),
        })
    }

    /// The instance's type descriptor.
    pub fn ty(&self) -> &Rc<ComponentType> {
        &self.ty
    }

    /// The renderable state.
    pub fn state(&self) -> &Rc<RenderState> {
        &self.state
    }

    /// Flags applied to this instance.
    pub fn flags(&self) -> BehaviorFlags {
        self.flags.get()
    }

    /// The signal behind a bindable property, if declared.
    pub fn bindable(&self, property: &str) -> Option<Signal<Value>> {
        self.bindables.borrow().get(property).cloned()
    }

    /// Write a bindable property. Returns false if the property was never
    /// declared (and therefore has no signal).
    pub fn set_bindable(&self, property: &str, value: Value) -> bool {
        match self.bindables.borrow().get(property) {
            Some(signal) => {
                signal.set(value);
                true
            }
            None => false,
        }
    }

    /// Run the created hook if the type implements it.
    pub fn created(&self) {
        if self.flags.get().contains(BehaviorFlags::HAS_CREATED) {
            self.component.borrow_mut().created();
        }
    }

    pub(crate) fn apply_flags(&self, flags: BehaviorFlags) {
        self.flags.set(flags);
    }

    pub(crate) fn install_bindable(&self, def: &BindableDef) {
        self.bindables
            .borrow_mut()
            .entry(def.property.clone())
            .or_insert_with(|| signal(def.default.clone()));
    }
}

impl Bindable for ComponentElement {
    fn bind(&self, scope: &Scope) {
        if self.flags.get().contains(BehaviorFlags::HAS_BINDING) {
            self.component.borrow_mut().binding();
        }
        self.state.set_scope(scope);
        self.state.bind_children(scope);
        if self.flags.get().contains(BehaviorFlags::HAS_BOUND) {
            self.component.borrow_mut().bound(scope);
        }
    }

    fn unbind(&self) {
        if self.flags.get().contains(BehaviorFlags::HAS_UNBINDING) {
            self.component.borrow_mut().unbinding();
        }
        self.state.unbind_children();
        self.state.clear_scope();
    }
}

impl Attachable for ComponentElement {
    fn attach(&self) {
        if self.flags.get().contains(BehaviorFlags::HAS_ATTACHING) {
            self.component.borrow_mut().attaching();
        }
        self.state.attach_children();
        if self.flags.get().contains(BehaviorFlags::HAS_ATTACHED) {
            self.component.borrow_mut().attached();
        }
    }

    fn detach(&self) {
        if self.flags.get().contains(BehaviorFlags::HAS_DETACHING) {
            self.component.borrow_mut().detaching();
        }
        self.state.detach_children();
    }
}

impl fmt::Debug for ComponentElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentElement")
            .field("type", &self.ty.name)
            .field("flags", &self.flags.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Plain;
    impl Component for Plain {}

    fn plain_type(name: &str) -> Rc<ComponentType> {
        Rc::new(ComponentType::element(
            name,
            Rc::new(|| Box::new(Plain) as Box<dyn Component>),
        ))
    }

    #[test]
    fn test_type_keys_are_unique() {
        let a = plain_type("a");
        let b = plain_type("b");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_bindable_requires_installation() {
        let ty = Rc::new(
            ComponentType::element("counter", Rc::new(|| Box::new(Plain) as Box<dyn Component>))
                .with_bindable("count", 0i64),
        );
        let element = ComponentElement::new(&ty);

        // Not installed until behavior application.
        assert!(element.bindable("count").is_none());
        assert!(!element.set_bindable("count", Value::Int(1)));

        element.install_bindable(&ty.bindables[0]);
        assert_eq!(
            element.bindable("count").unwrap().get(),
            Value::Int(0)
        );
        assert!(element.set_bindable("count", Value::Int(5)));
        assert_eq!(
            element.bindable("count").unwrap().get(),
            Value::Int(5)
        );
    }

    #[test]
    fn test_unflagged_hooks_are_skipped() {
        use std::cell::Cell as StdCell;

        thread_local! {
            static CALLS: StdCell<u32> = const { StdCell::new(0) };
        }

        struct Counting;
        impl Component for Counting {
            fn binding(&mut self) {
                CALLS.with(|c| c.set(c.get() + 1));
            }
        }

        let ty = Rc::new(ComponentType::element(
            "silent",
            Rc::new(|| Box::new(Counting) as Box<dyn Component>),
        ));
        let element = ComponentElement::new(&ty);

        // No HAS_BINDING flag applied: the hook must not run.
        element.bind(&Scope::default());
        assert_eq!(CALLS.with(|c| c.get()), 0);

        element.apply_flags(BehaviorFlags::HAS_BINDING);
        element.bind(&Scope::default());
        assert_eq!(CALLS.with(|c| c.get()), 1);
    }
}
