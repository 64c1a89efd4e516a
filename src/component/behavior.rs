//! Runtime behaviors.
//!
//! A [`RuntimeBehavior`] is per-*type* derived metadata: the bindable
//! declarations and hook-presence flags of one [`ComponentType`], computed
//! once and applied to every instance of that type. Application is the
//! cheap per-instance step: install one signal per declared bindable and
//! stamp the flags on.

use std::rc::Rc;

use tracing::debug;

use crate::component::{BehaviorFlags, BindableDef, ComponentElement, ComponentType};

/// Per-type derived metadata, applied to each instance.
#[derive(Debug)]
pub struct RuntimeBehavior {
    flags: BehaviorFlags,
    bindables: Vec<BindableDef>,
}

impl RuntimeBehavior {
    /// Derive the behavior for a component type.
    pub fn create(ty: &ComponentType) -> Rc<Self> {
        debug!(
            ty = %ty.name,
            bindables = ty.bindables.len(),
            "deriving runtime behavior"
        );
        Rc::new(RuntimeBehavior {
            flags: ty.flags,
            bindables: ty.bindables.clone(),
        })
    }

    /// Hook-presence flags of the type.
    pub fn flags(&self) -> BehaviorFlags {
        self.flags
    }

    /// Install bindable-property infrastructure onto one instance.
    pub fn apply_to(&self, element: &ComponentElement) {
        for def in &self.bindables {
            element.install_bindable(def);
        }
        element.apply_flags(self.flags);
    }
}
