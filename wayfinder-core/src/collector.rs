//! Discovery-time middleware collectors.

use std::any::Any;
use std::sync::Arc;

use crate::action::Action;
use crate::controller::{ControllerInstance, ControllerOptions};
use crate::handler::Handler;

/// What a collector sees of the action being registered.
pub struct CollectContext<'a> {
    pub instance: &'a ControllerInstance,
    pub class_name: &'a str,
    pub options: &'a ControllerOptions,
    pub action: &'a Action,
}

impl<'a> CollectContext<'a> {
    /// The controller instance as its concrete type, if it is a `C`.
    pub fn controller<C: Any + Send + Sync>(&self) -> Option<&C> {
        self.instance.downcast_ref::<C>()
    }

    /// Shortcut for `options.get(key)`.
    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.options.get(key)
    }
}

/// Contributes middleware to an action's chain, or vetoes the action.
///
/// Collectors run in registration order. Returning `false` stops the
/// remaining collectors and the action is not registered; its sibling
/// actions are unaffected.
///
/// Any `Fn(&CollectContext, &mut Vec<Handler>) -> bool` is a collector.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `MiddlewareCollector`",
    label = "this type cannot be used as a middleware collector",
    note = "implement `MiddlewareCollector` for your type, or pass a closure `|ctx, middleware| -> bool`"
)]
pub trait MiddlewareCollector: Send + Sync {
    fn collect(&self, ctx: &CollectContext<'_>, middleware: &mut Vec<Handler>) -> bool;
}

impl<F> MiddlewareCollector for F
where
    F: Fn(&CollectContext<'_>, &mut Vec<Handler>) -> bool + Send + Sync,
{
    fn collect(&self, ctx: &CollectContext<'_>, middleware: &mut Vec<Handler>) -> bool {
        self(ctx, middleware)
    }
}

/// Run `collectors` in order, stopping at the first veto.
///
/// Returns `false` when a collector vetoed. What earlier collectors pushed
/// stays in `middleware` either way.
pub fn run_collectors(
    collectors: &[Arc<dyn MiddlewareCollector>],
    ctx: &CollectContext<'_>,
    middleware: &mut Vec<Handler>,
) -> bool {
    collectors.iter().all(|c| c.collect(ctx, middleware))
}
