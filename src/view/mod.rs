//! Views and view factories.
//!
//! A [`View`] is a reusable renderable produced from a compiled template -
//! the thing control flow stamps out, binds, attaches, and eventually
//! releases. A [`ViewFactory`] creates them, optionally recycling released
//! views through a bounded pool so hot paths (list rendering, toggled
//! branches) stop re-stenciling projections they just threw away.
//!
//! Factories are named - part replacement looks factories up by name - and
//! carry a monotonic sequence number so factories that share a logical
//! name stay distinguishable.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::definition::CacheSize;
use crate::error::Result;
use crate::lifecycle::{Attachable, Bindable, RenderState, Scope};
use crate::render::Template;

// =============================================================================
// View
// =============================================================================

/// A reusable view instance.
pub struct View {
    state: Rc<RenderState>,
    factory: RefCell<Weak<ViewFactory>>,
    release_requested: Cell<bool>,
}

impl View {
    fn new(state: Rc<RenderState>) -> Rc<Self> {
        Rc::new(View {
            state,
            factory: RefCell::new(Weak::new()),
            release_requested: Cell::new(false),
        })
    }

    /// The view's renderable state.
    pub fn state(&self) -> &Rc<RenderState> {
        &self.state
    }

    /// Mark the view returnable and hand it back to its factory's pool.
    ///
    /// Returns whether the pool accepted it.
    pub fn release(self: &Rc<Self>) -> bool {
        self.release_requested.set(true);
        match self.factory.borrow().upgrade() {
            Some(factory) => factory.try_return_to_cache(self.clone()),
            None => false,
        }
    }
}

impl Bindable for View {
    fn bind(&self, scope: &Scope) {
        self.state.set_scope(scope);
        self.state.bind_children(scope);
    }

    fn unbind(&self) {
        self.state.unbind_children();
        self.state.clear_scope();
    }
}

impl Attachable for View {
    fn attach(&self) {
        self.state.attach_children();
    }

    fn detach(&self) {
        self.state.detach_children();
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("release_requested", &self.release_requested.get())
            .finish()
    }
}

// =============================================================================
// View Factory
// =============================================================================

thread_local! {
    /// Counter distinguishing factories that share a logical name.
    static NEXT_FACTORY_SEQUENCE: Cell<u64> = const { Cell::new(0) };
}

/// Produces views from a compiled template, with optional recycling.
pub struct ViewFactory {
    name: String,
    sequence: u64,
    template: Rc<dyn Template>,
    cache_size: Cell<CacheSize>,
    cache_size_set: Cell<bool>,
    cache: RefCell<Vec<Rc<View>>>,
}

impl ViewFactory {
    /// Create a factory over a template. Pooling is off until
    /// [`ViewFactory::set_cache_size`] turns it on.
    pub fn new(name: &str, template: Rc<dyn Template>) -> Rc<Self> {
        let sequence = NEXT_FACTORY_SEQUENCE.with(|next| {
            let sequence = next.get();
            next.set(sequence + 1);
            sequence
        });
        Rc::new(ViewFactory {
            name: name.to_string(),
            sequence,
            template,
            cache_size: Cell::new(CacheSize::None),
            cache_size_set: Cell::new(false),
            cache: RefCell::new(Vec::new()),
        })
    }

    /// The factory's logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Monotonic sequence number; unique per factory.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The current recycling bound.
    pub fn cache_size(&self) -> CacheSize {
        self.cache_size.get()
    }

    /// Set the recycling bound. With `do_not_override`, an explicitly
    /// configured bound is kept and this call is a no-op.
    pub fn set_cache_size(&self, size: CacheSize, do_not_override: bool) {
        if do_not_override && self.cache_size_set.get() {
            return;
        }
        self.cache_size.set(size);
        self.cache_size_set.set(true);
    }

    /// Whether the pool can take another view right now.
    pub fn can_return_to_cache(&self) -> bool {
        self.cache_size.get().can_hold(self.cache.borrow().len())
    }

    /// Accept a released view into the pool, if the bound allows.
    pub fn try_return_to_cache(&self, view: Rc<View>) -> bool {
        if !self.can_return_to_cache() {
            return false;
        }
        debug!(factory = %self.name, "pooling released view");
        self.cache.borrow_mut().push(view);
        true
    }

    /// Create a view: recycled from the pool when possible, freshly
    /// rendered from the template otherwise.
    pub fn create(self: &Rc<Self>) -> Result<Rc<View>> {
        if let Some(view) = self.cache.borrow_mut().pop() {
            debug!(factory = %self.name, "reusing pooled view");
            view.release_requested.set(false);
            return Ok(view);
        }

        let state = RenderState::new();
        self.template.render(&state, None, None)?;
        let view = View::new(state);
        *view.factory.borrow_mut() = Rc::downgrade(self);
        Ok(view)
    }

    /// Count of views currently pooled.
    pub fn pooled(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl fmt::Debug for ViewFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewFactory")
            .field("name", &self.name)
            .field("sequence", &self.sequence)
            .field("cache_size", &self.cache_size.get())
            .field("pooled", &self.pooled())
            .finish()
    }
}
