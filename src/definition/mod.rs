//! Template definitions and normalization.
//!
//! A [`TemplateDefinition`] is the immutable declarative description of a
//! view: node-template payload, targeted instructions, declared resource
//! dependencies, which named compiler to run, whether a build is still
//! required, and the view-recycling bound.
//!
//! Definitions are identity-cached by the rendering engine. Identity is an
//! explicit [`DefinitionId`] assigned when the definition is built - not
//! pointer identity - so the cache key survives any serialization or
//! cross-module boundary. Two structurally identical definitions with
//! distinct ids are deliberately distinct cache entries.
//!
//! Shorthand authoring goes through [`PartialDefinition`] and
//! [`build_template_definition`], which fills defaults (no pooling, build
//! not required, default compiler) and assigns the id.

mod instruction;

pub use instruction::{InstructionKind, TargetedInstruction};

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::ComponentType;
use crate::nodes::NodeTemplate;

// =============================================================================
// Definition Identity
// =============================================================================

/// Stable opaque identity of a definition. The engine's cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionId(u64);

thread_local! {
    /// Counter for assigning definition ids.
    static NEXT_DEFINITION_ID: RefCell<u64> = const { RefCell::new(0) };
}

impl DefinitionId {
    fn next() -> Self {
        NEXT_DEFINITION_ID.with(|next| {
            let mut next = next.borrow_mut();
            let id = *next;
            *next += 1;
            DefinitionId(id)
        })
    }
}

// =============================================================================
// Cache Size
// =============================================================================

/// Recycling bound for views produced from a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheSize {
    /// No pooling (the default).
    #[default]
    None,
    /// Pool at most this many released views.
    Bounded(usize),
    /// Pool every released view.
    Unbounded,
}

impl CacheSize {
    /// Whether a pool currently holding `held` views can take one more.
    pub fn can_hold(&self, held: usize) -> bool {
        match self {
            CacheSize::None => false,
            CacheSize::Bounded(limit) => held < *limit,
            CacheSize::Unbounded => true,
        }
    }
}

impl From<usize> for CacheSize {
    fn from(limit: usize) -> Self {
        if limit == 0 {
            CacheSize::None
        } else {
            CacheSize::Bounded(limit)
        }
    }
}

// =============================================================================
// Template Definition
// =============================================================================

/// Conventional compiler name used when a definition does not pick one.
pub const DEFAULT_COMPILER: &str = "default";

/// Immutable description of a view.
///
/// Authored once (by hand or as compiler output) and never mutated after
/// first use. Instruction row `i` applies to target `i` of the stenciled
/// projection.
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    id: DefinitionId,
    /// Logical name; view factories inherit it for replacement lookup.
    pub name: String,
    /// Node-template payload. `None` means logic-only (no view).
    pub template: Option<Rc<NodeTemplate>>,
    /// Targeted instructions, one row per target.
    pub instructions: Vec<Vec<TargetedInstruction>>,
    /// Resources this template uses, registered into its render context.
    pub dependencies: Vec<Rc<ComponentType>>,
    /// Named compiler to run when a build is required. `None` means
    /// [`DEFAULT_COMPILER`].
    pub compiler: Option<String>,
    /// Whether the payload still needs compilation into instructions.
    pub build_required: bool,
    /// View-recycling bound for factories built from this definition.
    pub cache_size: CacheSize,
}

impl TemplateDefinition {
    /// The definition's stable identity.
    pub fn id(&self) -> DefinitionId {
        self.id
    }

    /// The compiler name to use, falling back to the default.
    pub fn compiler_name(&self) -> &str {
        self.compiler.as_deref().unwrap_or(DEFAULT_COMPILER)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Shorthand definition input. Unset fields fall back to the existing
/// definition (if any), then to defaults.
#[derive(Debug, Clone, Default)]
pub struct PartialDefinition {
    pub name: Option<String>,
    pub template: Option<Rc<NodeTemplate>>,
    pub instructions: Option<Vec<Vec<TargetedInstruction>>>,
    pub dependencies: Option<Vec<Rc<ComponentType>>>,
    pub compiler: Option<String>,
    pub build_required: Option<bool>,
    pub cache_size: Option<CacheSize>,
}

/// Build a fully-specified definition from shorthand input.
///
/// Precedence per field: `partial`, then `existing`, then the default.
/// The result always carries a fresh [`DefinitionId`].
pub fn build_template_definition(
    existing: Option<&TemplateDefinition>,
    partial: PartialDefinition,
) -> Rc<TemplateDefinition> {
    Rc::new(TemplateDefinition {
        id: DefinitionId::next(),
        name: partial
            .name
            .or_else(|| existing.map(|d| d.name.clone()))
            .unwrap_or_default(),
        template: partial
            .template
            .or_else(|| existing.and_then(|d| d.template.clone())),
        instructions: partial
            .instructions
            .or_else(|| existing.map(|d| d.instructions.clone()))
            .unwrap_or_default(),
        dependencies: partial
            .dependencies
            .or_else(|| existing.map(|d| d.dependencies.clone()))
            .unwrap_or_default(),
        compiler: partial
            .compiler
            .or_else(|| existing.and_then(|d| d.compiler.clone())),
        build_required: partial
            .build_required
            .or_else(|| existing.map(|d| d.build_required))
            .unwrap_or(false),
        cache_size: partial
            .cache_size
            .or_else(|| existing.map(|d| d.cache_size))
            .unwrap_or_default(),
    })
}
