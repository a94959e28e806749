use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::action::Action;
use crate::controller::ControllerOptions;

/// Metadata declared for one controller type.
#[derive(Debug, Clone, Default)]
pub struct ClassMetadata {
    /// Set when the type is annotated as a controller.
    pub controller: Option<ControllerOptions>,
    /// Declared actions, in declaration order. `None` until at least one
    /// action (or an explicit empty list) is declared.
    pub actions: Option<Vec<Action>>,
}

/// Side table of controller metadata, keyed by controller type.
///
/// Populated explicitly at registration time (see
/// [`ControllerRegistry::controller`](crate::ControllerRegistry::controller))
/// and read by the loader when a file resolves to a controller type.
#[derive(Default)]
pub struct MetadataStore {
    inner: HashMap<TypeId, ClassMetadata>,
}

impl MetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotate `C` as a controller, replacing any earlier options.
    pub fn define_controller<C: Any>(&mut self, options: ControllerOptions) {
        self.entry::<C>().controller = Some(options);
    }

    /// Replace the declared actions of `C`.
    pub fn define_actions<C: Any>(&mut self, actions: Vec<Action>) {
        self.entry::<C>().actions = Some(actions);
    }

    /// Append one action to `C`'s declared actions.
    pub fn push_action<C: Any>(&mut self, action: Action) {
        self.entry::<C>()
            .actions
            .get_or_insert_with(Vec::new)
            .push(action);
    }

    /// Controller options of the given type, if it was annotated.
    pub fn controller_options(&self, type_id: TypeId) -> Option<&ControllerOptions> {
        self.inner.get(&type_id).and_then(|m| m.controller.as_ref())
    }

    /// Declared actions of the given type, if any were declared.
    pub fn actions(&self, type_id: TypeId) -> Option<&[Action]> {
        self.inner
            .get(&type_id)
            .and_then(|m| m.actions.as_deref())
    }

    /// Everything known about the given type.
    pub fn get(&self, type_id: TypeId) -> Option<&ClassMetadata> {
        self.inner.get(&type_id)
    }

    fn entry<C: Any>(&mut self) -> &mut ClassMetadata {
        self.inner.entry(TypeId::of::<C>()).or_default()
    }
}
