//! Rendering: compiled templates, render contexts, instruction dispatch.
//!
//! This module implements the instantiation path that turns a compiled
//! definition into a live renderable:
//!
//! ```text
//! Template.render → stencil projection → RenderContext.render
//!     → Renderer dispatch per target → hydrate components / set properties
//!     → child instances appended to the owner's bind/attach lists
//! ```
//!
//! - [`template`] - [`Template`] trait, [`CompiledTemplate`], the no-view
//!   template
//! - [`context`] - [`RenderContext`] and the [`ComponentOperation`] guard
//! - [`renderer`] - [`Renderer`] dispatch and the built-in instruction
//!   renderers

pub mod context;
pub mod renderer;
pub mod template;

pub use context::{create_render_context, ComponentOperation, RenderContext};
pub use renderer::{InstructionRenderer, Renderer};
pub use template::{no_view_template, CompiledTemplate, Template};
