//! Compiled templates.
//!
//! A [`CompiledTemplate`] binds a finalized definition to the stencil that
//! produces its node projections and to the render context that wires
//! projections to instructions. The no-view template handles logic-only
//! components with the same `render` shape, so callers never branch on
//! "does this component have a view".

use std::rc::Rc;

use crate::container::provider::PartsMap;
use crate::container::Container;
use crate::definition::TemplateDefinition;
use crate::engine::RenderingEngine;
use crate::error::Result;
use crate::lifecycle::RenderState;
use crate::nodes::{NodeRef, NodeSequence, NodeSequenceFactory, NodeTemplate};
use crate::render::context::{create_render_context, RenderContext};

// =============================================================================
// Template Trait
// =============================================================================

/// Produces a rendered state for one renderable instance.
pub trait Template {
    /// Stencil a projection, assign it (and the owning context) onto the
    /// renderable, and apply the definition's instructions.
    fn render(
        &self,
        renderable: &Rc<RenderState>,
        host: Option<&NodeRef>,
        parts: Option<&PartsMap>,
    ) -> Result<()>;

    /// The template's render context. `None` for the no-view template.
    fn render_context(&self) -> Option<&Rc<RenderContext>>;
}

// =============================================================================
// Compiled Template
// =============================================================================

/// A definition bound to its stencil and render context.
pub struct CompiledTemplate {
    definition: Rc<TemplateDefinition>,
    factory: NodeSequenceFactory,
    context: Rc<RenderContext>,
}

impl CompiledTemplate {
    /// Wrap a finalized definition. The context is derived as a child of
    /// `parent` with the definition's dependencies registered into it.
    pub(crate) fn new(
        engine: &Rc<RenderingEngine>,
        definition: Rc<TemplateDefinition>,
        template: Rc<NodeTemplate>,
        parent: &Container,
    ) -> Rc<Self> {
        let context = create_render_context(engine, parent, &definition.dependencies);
        Rc::new(CompiledTemplate {
            definition,
            factory: NodeSequenceFactory::new(template),
            context,
        })
    }

    /// The finalized definition this template renders.
    pub fn definition(&self) -> &Rc<TemplateDefinition> {
        &self.definition
    }
}

impl Template for CompiledTemplate {
    fn render(
        &self,
        renderable: &Rc<RenderState>,
        host: Option<&NodeRef>,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        let nodes = self.factory.create_node_sequence();
        let targets: Vec<NodeRef> = nodes.targets().to_vec();
        renderable.assign(Some(self.context.clone()), nodes)?;
        self.context
            .render(renderable, &targets, &self.definition, host, parts)
    }

    fn render_context(&self) -> Option<&Rc<RenderContext>> {
        Some(&self.context)
    }
}

// =============================================================================
// No-View Template
// =============================================================================

/// Template for logic-only components: empty projection, no context.
struct NoViewTemplate;

impl Template for NoViewTemplate {
    fn render(
        &self,
        renderable: &Rc<RenderState>,
        _host: Option<&NodeRef>,
        _parts: Option<&PartsMap>,
    ) -> Result<()> {
        renderable.assign(None, NodeSequence::empty())
    }

    fn render_context(&self) -> Option<&Rc<RenderContext>> {
        None
    }
}

thread_local! {
    static NO_VIEW: Rc<NoViewTemplate> = Rc::new(NoViewTemplate);
}

/// The canonical no-view template.
pub fn no_view_template() -> Rc<dyn Template> {
    NO_VIEW.with(|template| template.clone() as Rc<dyn Template>)
}
