//! Targeted instructions.
//!
//! A targeted instruction is a compiled directive describing what to bind
//! or attach at one located node. The compiler emits them; the renderer
//! dispatches on [`InstructionKind`] to apply them.

use std::fmt;
use std::rc::Rc;

use crate::definition::TemplateDefinition;
use crate::types::Value;

/// Dispatch key for instruction renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    SetProperty,
    HydrateElement,
    HydrateAttribute,
    HydrateTemplate,
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstructionKind::SetProperty => "set-property",
            InstructionKind::HydrateElement => "hydrate-element",
            InstructionKind::HydrateAttribute => "hydrate-attribute",
            InstructionKind::HydrateTemplate => "hydrate-template",
        };
        write!(f, "{}", name)
    }
}

/// A compiled directive for one target node.
#[derive(Debug, Clone)]
pub enum TargetedInstruction {
    /// Write a property value - onto the component under construction, or
    /// onto the raw target node when no component is in flight.
    SetProperty { property: String, value: Value },

    /// Construct the named custom element at the target and render its own
    /// template. Child instructions apply to the new instance.
    HydrateElement {
        resource: String,
        instructions: Vec<TargetedInstruction>,
    },

    /// Construct the named custom attribute on the target. Child
    /// instructions apply to the new instance.
    HydrateAttribute {
        resource: String,
        instructions: Vec<TargetedInstruction>,
    },

    /// Get-or-build a view factory for the inline definition and stamp a
    /// view out at the target render location. Replaceable-part overrides
    /// are resolved through the view-factory provider.
    HydrateTemplate { definition: Rc<TemplateDefinition> },
}

impl TargetedInstruction {
    /// Create a set-property instruction.
    pub fn set_property(property: &str, value: impl Into<Value>) -> Self {
        TargetedInstruction::SetProperty {
            property: property.to_string(),
            value: value.into(),
        }
    }

    /// The instruction's dispatch kind.
    pub fn kind(&self) -> InstructionKind {
        match self {
            TargetedInstruction::SetProperty { .. } => InstructionKind::SetProperty,
            TargetedInstruction::HydrateElement { .. } => InstructionKind::HydrateElement,
            TargetedInstruction::HydrateAttribute { .. } => InstructionKind::HydrateAttribute,
            TargetedInstruction::HydrateTemplate { .. } => InstructionKind::HydrateTemplate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_dispatch() {
        let set = TargetedInstruction::set_property("width", 40i64);
        assert_eq!(set.kind(), InstructionKind::SetProperty);

        let hydrate = TargetedInstruction::HydrateElement {
            resource: "counter".to_string(),
            instructions: vec![],
        };
        assert_eq!(hydrate.kind(), InstructionKind::HydrateElement);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(InstructionKind::SetProperty.to_string(), "set-property");
        assert_eq!(
            InstructionKind::HydrateTemplate.to_string(),
            "hydrate-template"
        );
    }
}
