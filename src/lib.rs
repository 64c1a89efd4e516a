//! # spark-templates
//!
//! Template instantiation runtime for SparkTUI.
//!
//! Built alongside [spark-signals](https://github.com/RLabs-Inc/spark-signals):
//! bindable component properties are signals, so the observation engine
//! picks up property writes without this crate knowing how.
//!
//! ## Architecture
//!
//! A declarative [`TemplateDefinition`] is compiled once (lazily, through a
//! pluggable named compiler), cached by identity, and instantiated as many
//! times as needed:
//!
//! ```text
//! TemplateDefinition → RenderingEngine → CompiledTemplate (cached)
//!                                            │
//!                             ViewFactory.create() / Template.render()
//!                                            │
//!                    fresh NodeSequence + scoped instruction dispatch
//!                                            │
//!                    instances linked into bind list + attach list
//!                                            │
//!                            bind pass, then attach pass
//! ```
//!
//! Dependency resolution is hierarchical: every compiled template owns a
//! [`RenderContext`] derived from its parent scope, with scoped providers
//! for "the current renderable / target / instruction / render location /
//! view factory" prepared per component operation and reset when the
//! operation's guard drops.
//!
//! ## Modules
//!
//! - [`types`] - the [`Value`] property model
//! - [`nodes`] - node templates, stencils, projections
//! - [`definition`] - definitions, identity, normalization, instructions
//! - [`container`] - hierarchical resolution containers and providers
//! - [`component`] - component types, instances, runtime behaviors
//! - [`lifecycle`] - renderable state and two-phase activation
//! - [`render`] - compiled templates, contexts, instruction dispatch
//! - [`view`] - views and pooled view factories
//! - [`engine`] - the memoizing orchestrator

pub mod component;
pub mod container;
pub mod definition;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod nodes;
pub mod render;
pub mod types;
pub mod view;

// Re-export commonly used items
pub use types::Value;

pub use component::{
    behavior::RuntimeBehavior, BehaviorFlags, BindableDef, Component, ComponentConstructor,
    ComponentElement, ComponentType, ResourceKind, TypeKey,
};

pub use container::{
    provider::{InstanceProvider, PartsMap, ViewFactoryProvider},
    Container, Key, Registry, Resolved, Resolver,
};

pub use definition::{
    build_template_definition, CacheSize, DefinitionId, InstructionKind, PartialDefinition,
    TargetedInstruction, TemplateDefinition, DEFAULT_COMPILER,
};

pub use engine::{CompilationFlags, RenderingEngine, ResourceDescriptions, TemplateCompiler};

pub use error::{Error, Result};

pub use lifecycle::{Attachable, Bindable, RenderState, Scope};

pub use nodes::{Node, NodeKind, NodeRef, NodeSequence, NodeSequenceFactory, NodeTemplate};

pub use render::{
    create_render_context, no_view_template, ComponentOperation, CompiledTemplate,
    InstructionRenderer, RenderContext, Renderer, Template,
};

pub use view::{View, ViewFactory};
