//! Instruction dispatch.
//!
//! A [`Renderer`] is created per render context and owns the dispatch
//! table from [`InstructionKind`] to [`InstructionRenderer`]. The four
//! built-in renderers cover the shipped instruction set; custom kinds can
//! be added with [`Renderer::with_instruction_renderer`] before the
//! renderer is handed to a context.
//!
//! Hydration is where the scoped providers earn their keep: each hydrator
//! begins a component operation on the context, constructs the instance
//! (recursively rendering its own template through the engine's caches),
//! applies child instructions, and disposes the operation before linking
//! the instance into its owner's bind and attach lists.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::component::{ComponentElement, ResourceKind};
use crate::container::provider::PartsMap;
use crate::definition::{InstructionKind, TargetedInstruction, TemplateDefinition};
use crate::engine::RenderingEngine;
use crate::error::{Error, Result};
use crate::lifecycle::RenderState;
use crate::nodes::{NodeRef, NodeSequence};
use crate::render::context::RenderContext;

// =============================================================================
// Instruction Renderer Trait
// =============================================================================

/// Applies one kind of targeted instruction.
pub trait InstructionRenderer {
    fn render(
        &self,
        engine: &Rc<RenderingEngine>,
        context: &RenderContext,
        renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        parts: Option<&PartsMap>,
    ) -> Result<()>;
}

// =============================================================================
// Renderer
// =============================================================================

/// Per-context instruction dispatcher.
pub struct Renderer {
    engine: Weak<RenderingEngine>,
    renderers: HashMap<InstructionKind, Rc<dyn InstructionRenderer>>,
}

impl Renderer {
    /// Create a renderer with the built-in instruction renderers.
    pub(crate) fn new(engine: Weak<RenderingEngine>) -> Self {
        let mut renderers: HashMap<InstructionKind, Rc<dyn InstructionRenderer>> = HashMap::new();
        renderers.insert(InstructionKind::SetProperty, Rc::new(SetPropertyRenderer));
        renderers.insert(
            InstructionKind::HydrateElement,
            Rc::new(HydrateElementRenderer),
        );
        renderers.insert(
            InstructionKind::HydrateAttribute,
            Rc::new(HydrateAttributeRenderer),
        );
        renderers.insert(
            InstructionKind::HydrateTemplate,
            Rc::new(HydrateTemplateRenderer),
        );
        Renderer { engine, renderers }
    }

    /// Add or replace the renderer for an instruction kind.
    pub fn with_instruction_renderer(
        mut self,
        kind: InstructionKind,
        renderer: Rc<dyn InstructionRenderer>,
    ) -> Self {
        self.renderers.insert(kind, renderer);
        self
    }

    /// Apply a definition's instruction rows against the targets.
    pub fn render(
        &self,
        context: &RenderContext,
        renderable: &Rc<RenderState>,
        targets: &[NodeRef],
        definition: &TemplateDefinition,
        host: Option<&NodeRef>,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        if targets.len() != definition.instructions.len() {
            return Err(Error::TargetCountMismatch {
                rows: definition.instructions.len(),
                targets: targets.len(),
            });
        }
        trace!(
            definition = %definition.name,
            targets = targets.len(),
            has_host = host.is_some(),
            "rendering"
        );
        for (target, row) in targets.iter().zip(&definition.instructions) {
            for instruction in row {
                self.render_instruction(context, renderable, target, instruction, parts)?;
            }
        }
        Ok(())
    }

    /// Dispatch a single instruction.
    pub(crate) fn render_instruction(
        &self,
        context: &RenderContext,
        renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        let engine = self.engine.upgrade().ok_or(Error::EngineReleased)?;
        let kind = instruction.kind();
        let renderer = self
            .renderers
            .get(&kind)
            .ok_or(Error::UnknownInstruction(kind))?;
        renderer.render(&engine, context, renderable, target, instruction, parts)
    }
}

// =============================================================================
// Built-in Renderers
// =============================================================================

/// Writes a property onto the raw target node.
struct SetPropertyRenderer;

impl InstructionRenderer for SetPropertyRenderer {
    fn render(
        &self,
        _engine: &Rc<RenderingEngine>,
        _context: &RenderContext,
        _renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        _parts: Option<&PartsMap>,
    ) -> Result<()> {
        let TargetedInstruction::SetProperty { property, value } = instruction else {
            return Err(Error::UnknownInstruction(instruction.kind()));
        };
        target.set_property(property, value.clone());
        Ok(())
    }
}

/// Writes a child property: the instance's bindable signal when declared,
/// the host node's property otherwise.
fn apply_component_property(
    element: &ComponentElement,
    target: &NodeRef,
    property: &str,
    value: &crate::types::Value,
) {
    if !element.set_bindable(property, value.clone()) {
        target.set_property(property, value.clone());
    }
}

/// Constructs a custom element at the target and renders its view.
struct HydrateElementRenderer;

impl InstructionRenderer for HydrateElementRenderer {
    fn render(
        &self,
        engine: &Rc<RenderingEngine>,
        context: &RenderContext,
        renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        let TargetedInstruction::HydrateElement {
            resource,
            instructions,
        } = instruction
        else {
            return Err(Error::UnknownInstruction(instruction.kind()));
        };

        let ty = context
            .container()
            .find_resource(ResourceKind::Element, resource, true)
            .ok_or_else(|| Error::UnknownResource {
                kind: ResourceKind::Element,
                name: resource.clone(),
            })?;
        trace!(element = %ty.name, "hydrating element");

        let element = ComponentElement::new(&ty);
        engine.apply_runtime_behavior(&ty, &element);

        let operation = context.begin_component_operation(
            element.state().clone(),
            target.clone(),
            Rc::new(instruction.clone()),
            None,
            parts,
            None,
        );

        match engine.get_element_template(ty.definition.as_ref(), Some(&ty))? {
            Some(template) => template.render(element.state(), Some(target), parts)?,
            None => element.state().assign(None, NodeSequence::empty())?,
        }

        for child in instructions {
            if let TargetedInstruction::SetProperty { property, value } = child {
                apply_component_property(&element, target, property, value);
            }
        }

        // The element's own construction is done; child hydrations begin
        // their own operations on this context, one at a time.
        operation.dispose();
        for child in instructions {
            if !matches!(child, TargetedInstruction::SetProperty { .. }) {
                context.render_instruction(element.state(), target, child, parts)?;
            }
        }

        element.created();
        renderable.add_bindable(element.clone());
        renderable.add_attachable(element);
        Ok(())
    }
}

/// Constructs a custom attribute on the target.
struct HydrateAttributeRenderer;

impl InstructionRenderer for HydrateAttributeRenderer {
    fn render(
        &self,
        engine: &Rc<RenderingEngine>,
        context: &RenderContext,
        renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        let TargetedInstruction::HydrateAttribute {
            resource,
            instructions,
        } = instruction
        else {
            return Err(Error::UnknownInstruction(instruction.kind()));
        };

        let ty = context
            .container()
            .find_resource(ResourceKind::Attribute, resource, true)
            .ok_or_else(|| Error::UnknownResource {
                kind: ResourceKind::Attribute,
                name: resource.clone(),
            })?;
        trace!(attribute = %ty.name, "hydrating attribute");

        let element = ComponentElement::new(&ty);
        engine.apply_runtime_behavior(&ty, &element);

        let operation = context.begin_component_operation(
            element.state().clone(),
            target.clone(),
            Rc::new(instruction.clone()),
            None,
            parts,
            None,
        );

        for child in instructions {
            if let TargetedInstruction::SetProperty { property, value } = child {
                apply_component_property(&element, target, property, value);
            }
        }

        operation.dispose();
        for child in instructions {
            if !matches!(child, TargetedInstruction::SetProperty { .. }) {
                context.render_instruction(element.state(), target, child, parts)?;
            }
        }

        element.created();
        renderable.add_bindable(element.clone());
        renderable.add_attachable(element);
        Ok(())
    }
}

/// Stamps a view out of an inline definition at the target location.
struct HydrateTemplateRenderer;

impl InstructionRenderer for HydrateTemplateRenderer {
    fn render(
        &self,
        engine: &Rc<RenderingEngine>,
        context: &RenderContext,
        renderable: &Rc<RenderState>,
        target: &NodeRef,
        instruction: &TargetedInstruction,
        parts: Option<&PartsMap>,
    ) -> Result<()> {
        let TargetedInstruction::HydrateTemplate { definition } = instruction else {
            return Err(Error::UnknownInstruction(instruction.kind()));
        };

        let factory = engine.view_factory_for(definition, Some(context.container()))?;
        trace!(factory = %factory.name(), "hydrating template");

        let operation = context.begin_component_operation(
            renderable.clone(),
            target.clone(),
            Rc::new(instruction.clone()),
            Some(factory),
            parts,
            Some(target.clone()),
        );

        // Resolving back through the provider applies part replacement.
        let effective = context.current_view_factory()?;
        let view = effective.create()?;
        operation.dispose();

        renderable.add_bindable(view.clone());
        renderable.add_attachable(view);
        Ok(())
    }
}
