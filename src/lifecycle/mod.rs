//! Renderable state and two-phase lifecycle.
//!
//! Every renderable - a view, a custom element, a custom attribute -
//! carries a [`RenderState`]: its render context and node projection
//! (exclusive, assigned exactly once when its template renders), its
//! binding [`Scope`], and two ordered lifecycle lists.
//!
//! The lists are owning ordered sequences, not intrusive linked nodes:
//! appending is O(1), insertion order is activation order, and there are
//! no prev/next fields to corrupt. Activation walks front-to-back;
//! deactivation walks back-to-front. Bind completes for a whole subtree
//! before attach begins anywhere in it - the caller sequences the two
//! passes, this module only guarantees order within each list.
//!
//! Construction is single-threaded and synchronous; the lists are built
//! during render and only traversed afterwards.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::nodes::NodeSequence;
use crate::render::RenderContext;
use crate::types::Value;

// =============================================================================
// Scope
// =============================================================================

/// A binding scope: the context value expressions evaluate against.
///
/// The expression grammar lives outside this crate; the runtime only
/// carries the scope from bind to the hooks that want it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    /// The binding context value.
    pub binding_context: Value,
}

impl Scope {
    /// Create a scope over a binding context value.
    pub fn new(binding_context: impl Into<Value>) -> Self {
        Scope {
            binding_context: binding_context.into(),
        }
    }
}

// =============================================================================
// Lifecycle Traits
// =============================================================================

/// Participates in the bind phase.
pub trait Bindable {
    /// Enter the bound state under `scope`.
    fn bind(&self, scope: &Scope);
    /// Leave the bound state.
    fn unbind(&self);
}

/// Participates in the attach phase.
pub trait Attachable {
    /// Enter the attached state.
    fn attach(&self);
    /// Leave the attached state.
    fn detach(&self);
}

// =============================================================================
// Render State
// =============================================================================

/// The renderable core shared by views, elements, and attributes.
pub struct RenderState {
    rendered: Cell<bool>,
    context: RefCell<Option<Rc<RenderContext>>>,
    nodes: RefCell<Option<NodeSequence>>,
    scope: RefCell<Option<Scope>>,
    bindables: RefCell<Vec<Rc<dyn Bindable>>>,
    attachables: RefCell<Vec<Rc<dyn Attachable>>>,
}

impl RenderState {
    /// Create an unrendered renderable core.
    pub fn new() -> Rc<Self> {
        Rc::new(RenderState {
            rendered: Cell::new(false),
            context: RefCell::new(None),
            nodes: RefCell::new(None),
            scope: RefCell::new(None),
            bindables: RefCell::new(Vec::new()),
            attachables: RefCell::new(Vec::new()),
        })
    }

    /// Assign the owning context and node projection. Called exactly once,
    /// by the template that renders this renderable; a `None` context is
    /// the no-view case.
    pub fn assign(
        &self,
        context: Option<Rc<RenderContext>>,
        nodes: NodeSequence,
    ) -> Result<()> {
        if self.rendered.get() {
            return Err(Error::AlreadyRendered);
        }
        self.rendered.set(true);
        *self.context.borrow_mut() = context;
        *self.nodes.borrow_mut() = Some(nodes);
        Ok(())
    }

    /// Whether a template has rendered into this state yet.
    pub fn is_rendered(&self) -> bool {
        self.rendered.get()
    }

    /// The owning render context, if any.
    pub fn context(&self) -> Option<Rc<RenderContext>> {
        self.context.borrow().clone()
    }

    /// The node projection. `None` until rendered.
    pub fn nodes(&self) -> Ref<'_, Option<NodeSequence>> {
        self.nodes.borrow()
    }

    /// The current binding scope, if bound.
    pub fn scope(&self) -> Option<Scope> {
        self.scope.borrow().clone()
    }

    /// Set the binding scope (entering the bound state).
    pub fn set_scope(&self, scope: &Scope) {
        *self.scope.borrow_mut() = Some(scope.clone());
    }

    /// Clear the binding scope (leaving the bound state).
    pub fn clear_scope(&self) {
        *self.scope.borrow_mut() = None;
    }

    // =========================================================================
    // Lifecycle Lists
    // =========================================================================

    /// Append to the bind list. First registered is first bound.
    pub fn add_bindable(&self, bindable: Rc<dyn Bindable>) {
        self.bindables.borrow_mut().push(bindable);
    }

    /// Append to the attach list. First registered is first attached.
    pub fn add_attachable(&self, attachable: Rc<dyn Attachable>) {
        self.attachables.borrow_mut().push(attachable);
    }

    /// Snapshot of the bind list in activation order.
    pub fn bindables(&self) -> Vec<Rc<dyn Bindable>> {
        self.bindables.borrow().clone()
    }

    /// Snapshot of the attach list in activation order.
    pub fn attachables(&self) -> Vec<Rc<dyn Attachable>> {
        self.attachables.borrow().clone()
    }

    /// Front of the bind list.
    pub fn first_bindable(&self) -> Option<Rc<dyn Bindable>> {
        self.bindables.borrow().first().cloned()
    }

    /// Back of the bind list.
    pub fn last_bindable(&self) -> Option<Rc<dyn Bindable>> {
        self.bindables.borrow().last().cloned()
    }

    // =========================================================================
    // Two-Phase Traversal
    // =========================================================================

    /// Bind every child in insertion order.
    pub fn bind_children(&self, scope: &Scope) {
        for bindable in self.bindables() {
            bindable.bind(scope);
        }
    }

    /// Unbind every child in reverse insertion order.
    pub fn unbind_children(&self) {
        for bindable in self.bindables().iter().rev() {
            bindable.unbind();
        }
    }

    /// Attach every child in insertion order. The caller is responsible
    /// for having completed the bind pass first.
    pub fn attach_children(&self) {
        for attachable in self.attachables() {
            attachable.attach();
        }
    }

    /// Detach every child in reverse insertion order.
    pub fn detach_children(&self) {
        for attachable in self.attachables().iter().rev() {
            attachable.detach();
        }
    }
}

impl std::fmt::Debug for RenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderState")
            .field("rendered", &self.rendered.get())
            .field("bindables", &self.bindables.borrow().len())
            .field("attachables", &self.attachables.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    /// Test double that records bind/attach calls into a shared journal.
    struct Recorder {
        name: &'static str,
        journal: Rc<StdRefCell<Vec<String>>>,
    }

    impl Recorder {
        fn new(name: &'static str, journal: &Rc<StdRefCell<Vec<String>>>) -> Rc<Self> {
            Rc::new(Recorder {
                name,
                journal: journal.clone(),
            })
        }
    }

    impl Bindable for Recorder {
        fn bind(&self, _scope: &Scope) {
            self.journal.borrow_mut().push(format!("bind:{}", self.name));
        }
        fn unbind(&self) {
            self.journal
                .borrow_mut()
                .push(format!("unbind:{}", self.name));
        }
    }

    impl Attachable for Recorder {
        fn attach(&self) {
            self.journal
                .borrow_mut()
                .push(format!("attach:{}", self.name));
        }
        fn detach(&self) {
            self.journal
                .borrow_mut()
                .push(format!("detach:{}", self.name));
        }
    }

    #[test]
    fn test_bind_order_is_insertion_order() {
        let journal = Rc::new(StdRefCell::new(Vec::new()));
        let state = RenderState::new();

        state.add_bindable(Recorder::new("a", &journal));
        state.add_bindable(Recorder::new("b", &journal));
        state.add_bindable(Recorder::new("c", &journal));

        state.bind_children(&Scope::default());
        assert_eq!(*journal.borrow(), vec!["bind:a", "bind:b", "bind:c"]);

        // Front and back of the list are the first and last registered.
        journal.borrow_mut().clear();
        state.first_bindable().unwrap().bind(&Scope::default());
        state.last_bindable().unwrap().bind(&Scope::default());
        assert_eq!(*journal.borrow(), vec!["bind:a", "bind:c"]);
    }

    #[test]
    fn test_unbind_is_reverse_order() {
        let journal = Rc::new(StdRefCell::new(Vec::new()));
        let state = RenderState::new();
        state.add_bindable(Recorder::new("a", &journal));
        state.add_bindable(Recorder::new("b", &journal));

        state.unbind_children();
        assert_eq!(*journal.borrow(), vec!["unbind:b", "unbind:a"]);
    }

    #[test]
    fn test_attach_after_bind_completes() {
        let journal = Rc::new(StdRefCell::new(Vec::new()));
        let state = RenderState::new();
        let node = Recorder::new("x", &journal);
        state.add_bindable(node.clone());
        state.add_attachable(node);

        state.bind_children(&Scope::default());
        state.attach_children();
        assert_eq!(*journal.borrow(), vec!["bind:x", "attach:x"]);
    }

    #[test]
    fn test_assign_is_set_once() {
        let state = RenderState::new();
        assert!(!state.is_rendered());

        state.assign(None, NodeSequence::empty()).unwrap();
        assert!(state.is_rendered());
        assert!(state.context().is_none());

        let second = state.assign(None, NodeSequence::empty());
        assert!(matches!(second, Err(Error::AlreadyRendered)));
    }

    #[test]
    fn test_scope_roundtrip() {
        let state = RenderState::new();
        assert!(state.scope().is_none());

        let scope = Scope::new("model");
        state.set_scope(&scope);
        assert_eq!(state.scope(), Some(scope));

        state.clear_scope();
        assert!(state.scope().is_none());
    }
}
