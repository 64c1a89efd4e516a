//! Render contexts and component operations.
//!
//! A [`RenderContext`] is the resolution scope of one compiled template: a
//! child of the parent container with the five scoped instance providers
//! installed under well-known keys and the template's declared
//! dependencies registered. The context binds one [`Renderer`] at creation
//! and delegates instruction application to it.
//!
//! Exactly one component's construction may be in flight on a context at a
//! time. That contract lives in the [`ComponentOperation`] guard returned
//! by [`RenderContext::begin_component_operation`]: dropping (or
//! explicitly disposing) the guard resets every provider, so a leaked
//! "current" value cannot bleed into the next instruction. Sibling
//! subtrees own sibling contexts and never contend.

use std::rc::Rc;

use crate::component::ComponentType;
use crate::container::provider::{InstanceProvider, PartsMap, ViewFactoryProvider};
use crate::container::{Container, Key};
use crate::definition::{TargetedInstruction, TemplateDefinition};
use crate::engine::RenderingEngine;
use crate::error::Result;
use crate::lifecycle::RenderState;
use crate::nodes::{Node, NodeRef};
use crate::render::renderer::Renderer;
use crate::view::ViewFactory;

// =============================================================================
// Render Context
// =============================================================================

/// The resolution scope of one compiled template.
pub struct RenderContext {
    container: Container,
    renderer: Renderer,
    renderable_provider: Rc<InstanceProvider<RenderState>>,
    target_provider: Rc<InstanceProvider<Node>>,
    instruction_provider: Rc<InstanceProvider<TargetedInstruction>>,
    location_provider: Rc<InstanceProvider<Node>>,
    factory_provider: Rc<ViewFactoryProvider>,
}

/// Derive a render context from a parent scope.
///
/// Installs the five scoped providers as resolvers for their well-known
/// keys and registers the declared dependencies into the child container.
pub fn create_render_context(
    engine: &Rc<RenderingEngine>,
    parent: &Container,
    dependencies: &[Rc<ComponentType>],
) -> Rc<RenderContext> {
    let container = parent.create_child();

    let renderable_provider = Rc::new(InstanceProvider::new());
    let target_provider = Rc::new(InstanceProvider::new());
    let instruction_provider = Rc::new(InstanceProvider::new());
    let location_provider = Rc::new(InstanceProvider::new());
    let factory_provider = Rc::new(ViewFactoryProvider::new(Rc::downgrade(engine)));

    container.register_resolver(Key::Renderable, renderable_provider.clone());
    container.register_resolver(Key::TargetNode, target_provider.clone());
    container.register_resolver(Key::Instruction, instruction_provider.clone());
    container.register_resolver(Key::RenderLocation, location_provider.clone());
    container.register_resolver(Key::ViewFactory, factory_provider.clone());

    for dependency in dependencies {
        container.register_resource(dependency.clone());
    }

    Rc::new(RenderContext {
        container,
        renderer: engine.create_renderer(),
        renderable_provider,
        target_provider,
        instruction_provider,
        location_provider,
        factory_provider,
    })
}

impl RenderContext {
    /// The context's resolution container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Apply a definition's instructions against the projection's targets,
    /// with `renderable` as the implicit current renderable.
    pub fn render(
        &self,
        renderable: &Rc<RenderState>,
        targets: &[NodeRef],
        definition: &TemplateDefinition,
        host: Option<&NodeRef>,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        self.renderer
            .render(self, renderable, targets, definition, host, parts)
    }

    /// Dispatch a single instruction through the bound renderer.
    pub(crate) fn render_instruction(
        &self,
        renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        self.renderer
            .render_instruction(self, renderable, target, instruction, parts)
    }

    /// Prepare the scoped providers for one component's construction.
    ///
    /// The renderable, target, and instruction providers are always
    /// prepared; the factory (with parts) and render-location providers
    /// only when those arguments are present. The returned guard must be
    /// disposed before the next operation begins on this context.
    pub fn begin_component_operation(
        &self,
        renderable: Rc<RenderState>,
        target: NodeRef,
        instruction: Rc<TargetedInstruction>,
        factory: Option<Rc<ViewFactory>>,
        parts: Option<&PartsMap>,
        location: Option<NodeRef>,
    ) -> ComponentOperation<'_> {
        self.renderable_provider.prepare(Some(renderable));
        self.target_provider.prepare(Some(target));
        self.instruction_provider.prepare(Some(instruction));
        if let Some(factory) = factory {
            self.factory_provider
                .prepare(factory, parts.cloned().unwrap_or_default());
        }
        if let Some(location) = location {
            self.location_provider.prepare(Some(location));
        }
        ComponentOperation { context: self }
    }

    /// Reset every scoped provider to its unset state.
    ///
    /// Clears per-operation scratch state only - registrations survive.
    /// Called by operation guards, and once more when the owning
    /// template's work is fully done, to release held instance references.
    pub fn dispose(&self) {
        self.renderable_provider.dispose();
        self.target_provider.dispose();
        self.instruction_provider.dispose();
        self.location_provider.dispose();
        self.factory_provider.dispose();
    }

    /// Whether any scoped provider is currently prepared.
    pub fn has_pending_operation(&self) -> bool {
        self.renderable_provider.is_prepared()
            || self.target_provider.is_prepared()
            || self.instruction_provider.is_prepared()
            || self.location_provider.is_prepared()
            || self.factory_provider.is_prepared()
    }

    // =========================================================================
    // Current-Value Accessors
    // =========================================================================

    /// The renderable currently under construction.
    pub fn current_renderable(&self) -> Result<Option<Rc<RenderState>>> {
        self.renderable_provider.resolve()
    }

    /// The node currently being processed.
    pub fn current_target(&self) -> Result<Option<NodeRef>> {
        self.target_provider.resolve()
    }

    /// The instruction currently being applied.
    pub fn current_instruction(&self) -> Result<Option<Rc<TargetedInstruction>>> {
        self.instruction_provider.resolve()
    }

    /// The render location for the view being stamped out.
    pub fn current_render_location(&self) -> Result<Option<NodeRef>> {
        self.location_provider.resolve()
    }

    /// The effective view factory, with replaceable-part overrides
    /// resolved against this context.
    pub fn current_view_factory(&self) -> Result<Rc<ViewFactory>> {
        self.factory_provider.resolve(&self.container)
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("pending_operation", &self.has_pending_operation())
            .finish()
    }
}

// =============================================================================
// Component Operation
// =============================================================================

/// Disposal handle for one in-flight component construction.
///
/// Dropping the guard resets the context's providers, so the "current"
/// values of one operation can never leak into the next.
pub struct ComponentOperation<'a> {
    context: &'a RenderContext,
}

impl ComponentOperation<'_> {
    /// End the operation, releasing the prepared providers.
    pub fn dispose(self) {
        // Drop does the work.
    }
}

impl Drop for ComponentOperation<'_> {
    fn drop(&mut self) {
        self.context.dispose();
    }
}
