//! Runtime errors.
//!
//! Every variant here is fatal: the runtime never retries and never
//! degrades silently. A misconfiguration caught at template-instantiation
//! time is a load-time bug; masking it would only resurface it later as a
//! much harder-to-diagnose rendering bug. Errors propagate to the
//! immediate caller with `?` and carry the diagnosis in the value itself.
//!
//! Absent definitions are data, not errors: `get_element_template(None)`
//! and `get_view_factory(None)` return `Ok(None)`.

use thiserror::Error;

use crate::component::ResourceKind;
use crate::definition::InstructionKind;

/// Runtime result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Template runtime errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A definition asked for a compiler name that was never registered.
    #[error("no template compiler registered under name: {0}")]
    UnknownCompiler(String),

    /// A scoped instance provider was resolved before any `prepare` call.
    ///
    /// Distinct from the prepared-empty case, which resolves successfully
    /// to the empty sentinel.
    #[error("instance provider resolved before prepare")]
    ProviderNotPrepared,

    /// A view factory with an empty name reached the replacement-lookup
    /// path. A factory must be nameable to support part replacement.
    #[error("cannot resolve replacement for an unnamed view factory")]
    UnnamedViewFactory,

    /// A renderable's node projection and context are exclusive, set-once
    /// fields; rendering the same renderable twice is a contract violation.
    #[error("renderable has already been rendered")]
    AlreadyRendered,

    /// The node projection produced a different number of targets than the
    /// definition has instruction rows.
    #[error("definition has {rows} instruction rows but projection produced {targets} targets")]
    TargetCountMismatch { rows: usize, targets: usize },

    /// An instruction referenced a resource that is not registered in the
    /// resolution scope it executes under.
    #[error("resource not registered: {kind} '{name}'")]
    UnknownResource { kind: ResourceKind, name: String },

    /// No instruction renderer is bound for this instruction kind.
    #[error("no renderer bound for instruction kind: {0}")]
    UnknownInstruction(InstructionKind),

    /// A weak engine handle outlived the rendering engine it pointed at.
    #[error("rendering engine has been released")]
    EngineReleased,

    /// A keyed registration was looked up but never made.
    #[error("nothing registered under key: {0}")]
    UnknownKey(String),
}
