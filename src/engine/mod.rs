//! Rendering engine - the top-level orchestrator.
//!
//! The engine owns the memoization layer: compiled templates and view
//! factories keyed by definition identity, runtime behaviors keyed by
//! component type. Entries never evict - definitions are a bounded,
//! load-time-determined set, and trading that memory for never compiling
//! twice is the point.
//!
//! Compilation is dispatched to a pluggable named compiler registered at
//! construction time. A definition that does not pick a compiler gets
//! `"default"`; asking for an unregistered name is a configuration error
//! and fails fatally at first use.
//!
//! Everything here is single-threaded and synchronous: a lookup either
//! returns immediately or fails, and the caches are plain `RefCell` maps.

pub mod lookup;

pub use lookup::ResourceDescriptions;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::debug;

use crate::component::behavior::RuntimeBehavior;
use crate::component::{ComponentElement, ComponentType, TypeKey};
use crate::container::Container;
use crate::definition::{
    build_template_definition, DefinitionId, PartialDefinition, TemplateDefinition,
};
use crate::error::{Error, Result};
use crate::render::template::{no_view_template, CompiledTemplate};
use crate::render::{Renderer, Template};
use crate::view::ViewFactory;

// =============================================================================
// Compiler Interface
// =============================================================================

bitflags! {
    /// Modes a compiler can be invoked in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompilationFlags: u8 {
        /// Compile the definition as a surrogate for a host element.
        const SURROGATE = 1 << 0;
    }
}

/// A pluggable template compiler, registered by name.
///
/// `compile` receives a read-only resource lookup over the resolution
/// scope and must return a finalized definition with the build flag
/// cleared.
pub trait TemplateCompiler {
    /// The registry name this compiler answers to.
    fn name(&self) -> &str;

    /// Compile a definition's payload into targeted instructions.
    fn compile(
        &self,
        definition: &TemplateDefinition,
        resources: &ResourceDescriptions<'_>,
        flags: CompilationFlags,
    ) -> Result<Rc<TemplateDefinition>>;
}

// =============================================================================
// Rendering Engine
// =============================================================================

/// Top-level orchestrator: memoized compilation, factory and behavior
/// caches, renderer construction.
pub struct RenderingEngine {
    container: Container,
    compilers: HashMap<String, Rc<dyn TemplateCompiler>>,
    template_lookup: RefCell<HashMap<DefinitionId, Rc<dyn Template>>>,
    factory_lookup: RefCell<HashMap<DefinitionId, Rc<ViewFactory>>>,
    behavior_lookup: RefCell<HashMap<TypeKey, Rc<RuntimeBehavior>>>,
}

impl RenderingEngine {
    /// Create an engine rooted at an application container, with the
    /// available compilers keyed by their names.
    pub fn new(container: Container, compilers: Vec<Rc<dyn TemplateCompiler>>) -> Rc<Self> {
        let compilers: HashMap<String, Rc<dyn TemplateCompiler>> = compilers
            .into_iter()
            .map(|compiler| (compiler.name().to_string(), compiler))
            .collect();
        debug!(compilers = compilers.len(), "rendering engine created");
        Rc::new(RenderingEngine {
            container,
            compilers,
            template_lookup: RefCell::new(HashMap::new()),
            factory_lookup: RefCell::new(HashMap::new()),
            behavior_lookup: RefCell::new(HashMap::new()),
        })
    }

    /// The application-level resolution container the engine is rooted at.
    pub fn container(&self) -> &Container {
        &self.container
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// The memoized compiled template for a definition.
    ///
    /// Absent definitions are data, not errors: the result is `Ok(None)`
    /// and nothing is compiled or cached. When `component_type` is given
    /// on first build, the type is registered into the new template's own
    /// render context so a self-recursive view can resolve its own type.
    pub fn get_element_template(
        self: &Rc<Self>,
        definition: Option<&Rc<TemplateDefinition>>,
        component_type: Option<&Rc<ComponentType>>,
    ) -> Result<Option<Rc<dyn Template>>> {
        let Some(definition) = definition else {
            return Ok(None);
        };

        if let Some(found) = self.template_lookup.borrow().get(&definition.id()) {
            return Ok(Some(found.clone()));
        }

        let template = self.template_from_source(definition, None)?;
        if let (Some(ty), Some(context)) = (component_type, template.render_context()) {
            context.container().register_resource(ty.clone());
        }
        self.template_lookup
            .borrow_mut()
            .insert(definition.id(), template.clone());
        Ok(Some(template))
    }

    /// The memoized view factory for a definition.
    ///
    /// The definition is normalized against defaults first; the factory is
    /// memoized by the *original* definition's identity and its recycling
    /// bound comes from the normalized definition.
    pub fn get_view_factory(
        self: &Rc<Self>,
        definition: Option<&Rc<TemplateDefinition>>,
        parent: Option<&Container>,
    ) -> Result<Option<Rc<ViewFactory>>> {
        let Some(definition) = definition else {
            return Ok(None);
        };
        Ok(Some(self.view_factory_for(definition, parent)?))
    }

    /// Get-or-build the factory for a definition that is known to exist.
    pub(crate) fn view_factory_for(
        self: &Rc<Self>,
        definition: &Rc<TemplateDefinition>,
        parent: Option<&Container>,
    ) -> Result<Rc<ViewFactory>> {
        if let Some(found) = self.factory_lookup.borrow().get(&definition.id()) {
            return Ok(found.clone());
        }

        let normalized = build_template_definition(Some(definition), PartialDefinition::default());
        let template = self.template_from_source(&normalized, parent)?;
        let factory = ViewFactory::new(&normalized.name, template);
        factory.set_cache_size(normalized.cache_size, true);
        debug!(factory = %normalized.name, "view factory created");

        self.factory_lookup
            .borrow_mut()
            .insert(definition.id(), factory.clone());
        Ok(factory)
    }

    // =========================================================================
    // Behaviors
    // =========================================================================

    /// Apply the memoized runtime behavior of a type to one instance.
    pub fn apply_runtime_behavior(&self, ty: &Rc<ComponentType>, element: &ComponentElement) {
        let behavior = {
            let mut lookup = self.behavior_lookup.borrow_mut();
            lookup
                .entry(ty.key())
                .or_insert_with(|| RuntimeBehavior::create(ty))
                .clone()
        };
        behavior.apply_to(element);
    }

    // =========================================================================
    // Renderers
    // =========================================================================

    /// Create a renderer. Pure factory, no caching: a renderer is 1:1
    /// with the render context that binds it at creation.
    pub fn create_renderer(self: &Rc<Self>) -> Renderer {
        Renderer::new(Rc::downgrade(self))
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// Turn a definition into a template.
    ///
    /// No payload means the canonical no-view template. A payload that
    /// still requires a build goes through the named compiler; an
    /// unregistered name is fatal.
    fn template_from_source(
        self: &Rc<Self>,
        definition: &Rc<TemplateDefinition>,
        parent: Option<&Container>,
    ) -> Result<Rc<dyn Template>> {
        let parent = parent.unwrap_or(&self.container);

        if definition.template.is_none() {
            debug!(definition = %definition.name, "no view payload");
            return Ok(no_view_template());
        }

        let finalized = if definition.build_required {
            let name = definition.compiler_name();
            let compiler = self
                .compilers
                .get(name)
                .ok_or_else(|| Error::UnknownCompiler(name.to_string()))?;
            debug!(definition = %definition.name, compiler = name, "compiling definition");
            let resources = ResourceDescriptions::new(parent);
            compiler.compile(definition, &resources, CompilationFlags::SURROGATE)?
        } else {
            definition.clone()
        };

        match finalized.template.clone() {
            Some(payload) => {
                let template = CompiledTemplate::new(self, finalized, payload, parent);
                Ok(template as Rc<dyn Template>)
            }
            None => Ok(no_view_template()),
        }
    }

    // =========================================================================
    // Cache Introspection
    // =========================================================================

    /// Number of compiled templates held.
    pub fn cached_templates(&self) -> usize {
        self.template_lookup.borrow().len()
    }

    /// Number of view factories held.
    pub fn cached_factories(&self) -> usize {
        self.factory_lookup.borrow().len()
    }

    /// Number of runtime behaviors held.
    pub fn cached_behaviors(&self) -> usize {
        self.behavior_lookup.borrow().len()
    }
}

impl std::fmt::Debug for RenderingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingEngine")
            .field("compilers", &self.compilers.len())
            .field("templates", &self.cached_templates())
            .field("factories", &self.cached_factories())
            .field("behaviors", &self.cached_behaviors())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::cell::RefCell as StdRefCell;

    use crate::component::{BehaviorFlags, Component, ComponentType, ResourceKind};
    use crate::container::provider::ViewFactoryProvider;
    use crate::definition::{CacheSize, TargetedInstruction};
    use crate::lifecycle::{RenderState, Scope};
    use crate::nodes::NodeTemplate;
    use crate::types::Value;

    // =========================================================================
    // Fixtures
    // =========================================================================

    struct Plain;
    impl Component for Plain {}

    fn plain_ctor() -> crate::component::ComponentConstructor {
        Rc::new(|| Box::new(Plain) as Box<dyn Component>)
    }

    /// Compiler double that counts invocations and clears the build flag.
    struct CountingCompiler {
        calls: Rc<Cell<usize>>,
    }

    impl TemplateCompiler for CountingCompiler {
        fn name(&self) -> &str {
            "default"
        }

        fn compile(
            &self,
            definition: &TemplateDefinition,
            _resources: &ResourceDescriptions<'_>,
            flags: CompilationFlags,
        ) -> Result<Rc<TemplateDefinition>> {
            assert!(flags.contains(CompilationFlags::SURROGATE));
            self.calls.set(self.calls.get() + 1);
            Ok(build_template_definition(
                Some(definition),
                PartialDefinition {
                    build_required: Some(false),
                    ..Default::default()
                },
            ))
        }
    }

    fn engine_with_counting_compiler() -> (Rc<RenderingEngine>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let compiler = Rc::new(CountingCompiler {
            calls: calls.clone(),
        }) as Rc<dyn TemplateCompiler>;
        let engine = RenderingEngine::new(Container::root(), vec![compiler]);
        (engine, calls)
    }

    fn bare_engine() -> Rc<RenderingEngine> {
        RenderingEngine::new(Container::root(), vec![])
    }

    fn definition_with_view(name: &str) -> Rc<TemplateDefinition> {
        build_template_definition(
            None,
            PartialDefinition {
                name: Some(name.to_string()),
                template: Some(Rc::new(NodeTemplate::element("box"))),
                ..Default::default()
            },
        )
    }

    // =========================================================================
    // Memoization & Null Propagation
    // =========================================================================

    #[test]
    fn test_template_memoized_and_compiled_once() {
        let (engine, calls) = engine_with_counting_compiler();
        let definition = build_template_definition(
            None,
            PartialDefinition {
                name: Some("card".to_string()),
                template: Some(Rc::new(NodeTemplate::element("box"))),
                build_required: Some(true),
                ..Default::default()
            },
        );

        let first = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();
        let second = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(engine.cached_templates(), 1);
    }

    #[test]
    fn test_identical_content_distinct_identity_compiles_twice() {
        let (engine, calls) = engine_with_counting_compiler();
        let make = || {
            build_template_definition(
                None,
                PartialDefinition {
                    template: Some(Rc::new(NodeTemplate::element("box"))),
                    build_required: Some(true),
                    ..Default::default()
                },
            )
        };

        engine.get_element_template(Some(&make()), None).unwrap();
        engine.get_element_template(Some(&make()), None).unwrap();

        // Identity, not structure, is the cache granularity.
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_absent_definition_is_data() {
        let (engine, calls) = engine_with_counting_compiler();

        assert!(engine.get_element_template(None, None).unwrap().is_none());
        assert!(engine.get_view_factory(None, None).unwrap().is_none());
        assert_eq!(calls.get(), 0);
        assert_eq!(engine.cached_templates(), 0);
        assert_eq!(engine.cached_factories(), 0);
    }

    #[test]
    fn test_unknown_compiler_is_fatal() {
        let engine = bare_engine();
        let definition = build_template_definition(
            None,
            PartialDefinition {
                template: Some(Rc::new(NodeTemplate::element("box"))),
                build_required: Some(true),
                compiler: Some("exotic".to_string()),
                ..Default::default()
            },
        );

        match engine.get_element_template(Some(&definition), None) {
            Err(Error::UnknownCompiler(name)) => assert_eq!(name, "exotic"),
            other => panic!("expected UnknownCompiler, got {:?}", other.map(|_| ())),
        }
    }

    // =========================================================================
    // No-View Definitions
    // =========================================================================

    #[test]
    fn test_no_view_definition_renders_empty() {
        let engine = bare_engine();
        let definition = build_template_definition(
            None,
            PartialDefinition {
                name: Some("logic-only".to_string()),
                cache_size: Some(CacheSize::Bounded(8)),
                ..Default::default()
            },
        );

        let template = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();
        assert!(template.render_context().is_none());

        let renderable = RenderState::new();
        template.render(&renderable, None, None).unwrap();
        assert!(renderable.context().is_none());
        assert!(renderable.nodes().as_ref().unwrap().is_empty());
    }

    // =========================================================================
    // View Factories
    // =========================================================================

    #[test]
    fn test_factory_memoized_by_original_identity() {
        let engine = bare_engine();
        let definition = definition_with_view("row");

        let first = engine
            .get_view_factory(Some(&definition), None)
            .unwrap()
            .unwrap();
        let second = engine
            .get_view_factory(Some(&definition), None)
            .unwrap()
            .unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(engine.cached_factories(), 1);
    }

    #[test]
    fn test_factory_takes_bound_from_normalized_definition() {
        let engine = bare_engine();
        let definition = build_template_definition(
            None,
            PartialDefinition {
                name: Some("row".to_string()),
                template: Some(Rc::new(NodeTemplate::element("box"))),
                cache_size: Some(CacheSize::Bounded(3)),
                ..Default::default()
            },
        );

        let factory = engine
            .get_view_factory(Some(&definition), None)
            .unwrap()
            .unwrap();
        assert_eq!(factory.name(), "row");
        assert_eq!(factory.cache_size(), CacheSize::Bounded(3));
    }

    // =========================================================================
    // Runtime Behaviors
    // =========================================================================

    #[test]
    fn test_behavior_memoized_per_type() {
        let engine = bare_engine();
        let ty = Rc::new(
            ComponentType::element("gauge", plain_ctor()).with_bindable("level", 0i64),
        );

        let a = ComponentElement::new(&ty);
        let b = ComponentElement::new(&ty);
        engine.apply_runtime_behavior(&ty, &a);
        engine.apply_runtime_behavior(&ty, &b);

        assert_eq!(engine.cached_behaviors(), 1);
        assert_eq!(a.bindable("level").unwrap().get(), Value::Int(0));
        assert_eq!(b.bindable("level").unwrap().get(), Value::Int(0));
    }

    // =========================================================================
    // Self-Recursion
    // =========================================================================

    #[test]
    fn test_component_type_registered_for_self_recursion() {
        let engine = bare_engine();
        let definition = definition_with_view("tree-item");
        let ty = Rc::new(
            ComponentType::element("tree-item", plain_ctor()).with_definition(definition.clone()),
        );

        let template = engine
            .get_element_template(Some(&definition), Some(&ty))
            .unwrap()
            .unwrap();

        // The type resolves inside its own template's context subtree...
        let context = template.render_context().unwrap();
        let found = context
            .container()
            .find_resource(ResourceKind::Element, "tree-item", false)
            .unwrap();
        assert_eq!(found.key(), ty.key());

        // ...and a nested request for the same definition hits the cache.
        let nested = engine
            .get_element_template(Some(&definition), Some(&ty))
            .unwrap()
            .unwrap();
        assert!(Rc::ptr_eq(&template, &nested));
        assert_eq!(engine.cached_templates(), 1);
    }

    // =========================================================================
    // Hydration (integration)
    // =========================================================================

    thread_local! {
        static JOURNAL: StdRefCell<Vec<String>> = const { StdRefCell::new(Vec::new()) };
    }

    fn journal_take() -> Vec<String> {
        JOURNAL.with(|journal| journal.borrow_mut().drain(..).collect())
    }

    struct Journaling;
    impl Component for Journaling {
        fn created(&mut self) {
            JOURNAL.with(|j| j.borrow_mut().push("created".to_string()));
        }
        fn binding(&mut self) {
            JOURNAL.with(|j| j.borrow_mut().push("binding".to_string()));
        }
        fn bound(&mut self, _scope: &Scope) {
            JOURNAL.with(|j| j.borrow_mut().push("bound".to_string()));
        }
        fn attaching(&mut self) {
            JOURNAL.with(|j| j.borrow_mut().push("attaching".to_string()));
        }
        fn attached(&mut self) {
            JOURNAL.with(|j| j.borrow_mut().push("attached".to_string()));
        }
    }

    fn journaling_type(name: &str) -> Rc<ComponentType> {
        Rc::new(
            ComponentType::element(
                name,
                Rc::new(|| Box::new(Journaling) as Box<dyn Component>),
            )
            .with_bindable("label", "")
            .with_flags(
                BehaviorFlags::HAS_CREATED
                    | BehaviorFlags::HAS_BINDING
                    | BehaviorFlags::HAS_BOUND
                    | BehaviorFlags::HAS_ATTACHING
                    | BehaviorFlags::HAS_ATTACHED,
            ),
        )
    }

    /// Outer definition with one target hydrating the given element type.
    fn hydrating_definition(ty: &Rc<ComponentType>) -> Rc<TemplateDefinition> {
        build_template_definition(
            None,
            PartialDefinition {
                name: Some("outer".to_string()),
                template: Some(Rc::new(
                    NodeTemplate::element("box")
                        .child(NodeTemplate::element("slot").target()),
                )),
                instructions: Some(vec![vec![TargetedInstruction::HydrateElement {
                    resource: ty.name.clone(),
                    instructions: vec![
                        TargetedInstruction::set_property("label", "hello"),
                        TargetedInstruction::set_property("undeclared", 1i64),
                    ],
                }]]),
                dependencies: Some(vec![ty.clone()]),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_hydrate_element_end_to_end() {
        journal_take();
        let engine = bare_engine();
        let ty = journaling_type("badge");
        let definition = hydrating_definition(&ty);

        let template = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();
        let renderable = RenderState::new();
        template.render(&renderable, None, None).unwrap();

        // Hydration ran created, nothing is bound yet.
        assert_eq!(journal_take(), vec!["created"]);

        // The declared bindable went to the signal, the undeclared
        // property fell through to the target node.
        let nodes = renderable.nodes();
        let target = nodes.as_ref().unwrap().targets()[0].clone();
        drop(nodes);
        assert_eq!(target.property("label"), None);
        assert_eq!(target.property("undeclared"), Some(Value::Int(1)));

        // Two-phase activation: bind completes before attach starts.
        renderable.bind_children(&Scope::new("model"));
        renderable.attach_children();
        assert_eq!(
            journal_take(),
            vec!["binding", "bound", "attaching", "attached"]
        );

        // No operation left in flight on the template's context.
        assert!(!template.render_context().unwrap().has_pending_operation());
    }

    #[test]
    fn test_hydrate_unknown_resource_is_fatal() {
        let engine = bare_engine();
        let definition = build_template_definition(
            None,
            PartialDefinition {
                template: Some(Rc::new(
                    NodeTemplate::element("box")
                        .child(NodeTemplate::element("slot").target()),
                )),
                instructions: Some(vec![vec![TargetedInstruction::HydrateElement {
                    resource: "ghost".to_string(),
                    instructions: vec![],
                }]]),
                ..Default::default()
            },
        );

        let template = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();
        let result = template.render(&RenderState::new(), None, None);
        assert!(matches!(
            result,
            Err(Error::UnknownResource {
                kind: ResourceKind::Element,
                ..
            })
        ));
    }

    #[test]
    fn test_target_count_mismatch_is_fatal() {
        let engine = bare_engine();
        let definition = build_template_definition(
            None,
            PartialDefinition {
                // No targets in the payload, one instruction row.
                template: Some(Rc::new(NodeTemplate::element("box"))),
                instructions: Some(vec![vec![TargetedInstruction::set_property("x", 1i64)]]),
                ..Default::default()
            },
        );

        let template = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();
        let result = template.render(&RenderState::new(), None, None);
        assert!(matches!(
            result,
            Err(Error::TargetCountMismatch {
                rows: 1,
                targets: 0
            })
        ));
    }

    // =========================================================================
    // Component Operations
    // =========================================================================

    #[test]
    fn test_operation_guard_resets_providers() {
        let engine = bare_engine();
        let definition = definition_with_view("row");
        let template = engine
            .get_element_template(Some(&definition), None)
            .unwrap()
            .unwrap();
        let context = template.render_context().unwrap();

        let operation = context.begin_component_operation(
            RenderState::new(),
            crate::nodes::NodeSequenceFactory::new(Rc::new(NodeTemplate::marker()))
                .create_node_sequence()
                .targets()[0]
                .clone(),
            Rc::new(TargetedInstruction::set_property("x", 1i64)),
            None,
            None,
            None,
        );
        assert!(context.has_pending_operation());
        assert!(context.current_renderable().unwrap().is_some());

        operation.dispose();
        assert!(!context.has_pending_operation());
        assert!(matches!(
            context.current_renderable(),
            Err(Error::ProviderNotPrepared)
        ));

        // A second operation behaves as on a fresh context.
        let again = context.begin_component_operation(
            RenderState::new(),
            crate::nodes::NodeSequenceFactory::new(Rc::new(NodeTemplate::marker()))
                .create_node_sequence()
                .targets()[0]
                .clone(),
            Rc::new(TargetedInstruction::set_property("y", 2i64)),
            None,
            None,
            None,
        );
        assert!(context.current_renderable().unwrap().is_some());
        drop(again);
        assert!(!context.has_pending_operation());
    }

    // =========================================================================
    // Replaceable Parts
    // =========================================================================

    #[test]
    fn test_replacement_takes_precedence() {
        let engine = bare_engine();
        let default_def = build_template_definition(
            None,
            PartialDefinition {
                name: Some("content".to_string()),
                template: Some(Rc::new(NodeTemplate::element("default-view"))),
                ..Default::default()
            },
        );
        let replacement_def = build_template_definition(
            None,
            PartialDefinition {
                name: Some("content".to_string()),
                template: Some(Rc::new(NodeTemplate::element("replacement-view"))),
                ..Default::default()
            },
        );

        let default_factory = engine.view_factory_for(&default_def, None).unwrap();
        let provider = ViewFactoryProvider::new(Rc::downgrade(&engine));

        let mut replacements = HashMap::new();
        replacements.insert("content".to_string(), replacement_def.clone());
        provider.prepare(default_factory.clone(), replacements);

        let resolved = provider.resolve(engine.container()).unwrap();
        assert!(!Rc::ptr_eq(&resolved, &default_factory));

        let view = resolved.create().unwrap();
        let nodes = view.state().nodes();
        assert_eq!(nodes.as_ref().unwrap().roots()[0].tag(), Some("replacement-view"));
        drop(nodes);

        // Replacement factories share the engine's single-compile cache.
        let resolved_again = provider.resolve(engine.container()).unwrap();
        assert!(Rc::ptr_eq(&resolved, &resolved_again));

        // Without the key, the default factory comes back unchanged.
        provider.prepare(default_factory.clone(), HashMap::new());
        let unchanged = provider.resolve(engine.container()).unwrap();
        assert!(Rc::ptr_eq(&unchanged, &default_factory));
    }

    #[test]
    fn test_unnamed_factory_is_fatal_on_replacement_lookup() {
        let engine = bare_engine();
        let unnamed_def = build_template_definition(
            None,
            PartialDefinition {
                template: Some(Rc::new(NodeTemplate::element("box"))),
                ..Default::default()
            },
        );

        let factory = engine.view_factory_for(&unnamed_def, None).unwrap();
        let provider = ViewFactoryProvider::new(Rc::downgrade(&engine));
        provider.prepare(factory, HashMap::new());

        assert!(matches!(
            provider.resolve(engine.container()),
            Err(Error::UnnamedViewFactory)
        ));
    }

    #[test]
    fn test_hydrate_template_with_part_replacement() {
        let engine = bare_engine();
        let part_def = build_template_definition(
            None,
            PartialDefinition {
                name: Some("body".to_string()),
                template: Some(Rc::new(NodeTemplate::element("default-body"))),
                ..Default::default()
            },
        );
        let replacement_def = build_template_definition(
            None,
            PartialDefinition {
                name: Some("body".to_string()),
                template: Some(Rc::new(NodeTemplate::element("custom-body"))),
                ..Default::default()
            },
        );

        let outer = build_template_definition(
            None,
            PartialDefinition {
                name: Some("shell".to_string()),
                template: Some(Rc::new(
                    NodeTemplate::element("box").child(NodeTemplate::marker()),
                )),
                instructions: Some(vec![vec![TargetedInstruction::HydrateTemplate {
                    definition: part_def,
                }]]),
                ..Default::default()
            },
        );

        let template = engine
            .get_element_template(Some(&outer), None)
            .unwrap()
            .unwrap();
        let renderable = RenderState::new();

        let mut parts = HashMap::new();
        parts.insert("body".to_string(), replacement_def.clone());
        template.render(&renderable, None, Some(&parts)).unwrap();

        // One view landed in each lifecycle list.
        assert_eq!(renderable.bindables().len(), 1);
        assert_eq!(renderable.attachables().len(), 1);

        // Both the default part and its replacement went through the
        // engine's factory cache during the render.
        assert_eq!(engine.cached_factories(), 2);
        let replacement_factory = engine
            .get_view_factory(Some(&replacement_def), None)
            .unwrap()
            .unwrap();
        assert_eq!(engine.cached_factories(), 2);

        // Views stamped for the part use the replacement's payload.
        let probe = replacement_factory.create().unwrap();
        let nodes = probe.state().nodes();
        assert_eq!(
            nodes.as_ref().unwrap().roots()[0].tag(),
            Some("custom-body")
        );
    }
}
