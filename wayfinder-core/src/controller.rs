//! Controllers, their options, and the registry binding them to source files.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::action::Action;
use crate::http::{IntoResponse, Request};
use crate::metadata::MetadataStore;

/// A live controller. One instance serves every action of its controller.
pub type ControllerInstance = Arc<dyn Any + Send + Sync>;

/// A type whose methods are exposed as HTTP actions.
///
/// Returning `None` from [`construct`](Controller::construct) opts the
/// controller out of registration for this load, which is how conditional
/// controllers are expressed.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Controller`",
    label = "this type cannot be registered as a controller",
    note = "implement `Controller::construct` for your type, then register it with `ControllerRegistry::controller`"
)]
pub trait Controller: Send + Sync + Sized + 'static {
    fn construct(options: &ConstructOptions) -> Option<Self>;
}

/// Options passed unchanged to every controller constructor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructOptions {
    values: serde_json::Map<String, Value>,
}

impl ConstructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Deserialize a value into `T`. Missing keys and shape mismatches yield `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Options attached to a controller class when it is annotated as one.
///
/// `prefix` composes with explicit action paths. Every other key is kept
/// as-is for loader hooks and middleware collectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerOptions {
    pub prefix: Option<String>,
    extra: BTreeMap<String, Value>,
}

impl ControllerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attach an arbitrary key. `prefix` is routed to the typed field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == "prefix" {
            if let Value::String(prefix) = value {
                self.prefix = Some(prefix);
                return self;
            }
        }
        self.extra.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// All keys other than `prefix`.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

type Constructor = Arc<dyn Fn(&ConstructOptions) -> Option<ControllerInstance> + Send + Sync>;

/// Type-erased reference to a controller type.
#[derive(Clone)]
pub struct ControllerClass {
    type_id: TypeId,
    name: &'static str,
    constructor: Constructor,
}

impl ControllerClass {
    pub fn of<C: Controller>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: short_type_name(std::any::type_name::<C>()),
            constructor: Arc::new(|options: &ConstructOptions| {
                C::construct(options).map(|c| Arc::new(c) as ControllerInstance)
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Unqualified type name (e.g. `User` for `app::api::user::User`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn construct(&self, options: &ConstructOptions) -> Option<ControllerInstance> {
        (self.constructor)(options)
    }
}

impl std::fmt::Debug for ControllerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerClass")
            .field("name", &self.name)
            .finish()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

/// Binds module keys (file locations relative to the scan root) to
/// controller types, and holds the metadata declared for each type.
#[derive(Default)]
pub struct ControllerRegistry {
    modules: HashMap<String, ControllerClass>,
    metadata: MetadataStore,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `C` as the controller exported by the file at `module`
    /// (e.g. `"admin/dashboard"` for `<root>/admin/dashboard.rs`).
    ///
    /// Registering a second type under the same module replaces the first.
    pub fn controller<C: Controller>(&mut self, module: impl AsRef<str>) -> ControllerDef<'_, C> {
        self.modules
            .insert(normalize_module_key(module.as_ref()), ControllerClass::of::<C>());
        ControllerDef {
            metadata: &mut self.metadata,
            _marker: PhantomData,
        }
    }

    /// Declare metadata for `C` without binding it to a module.
    pub fn define<C: Controller>(&mut self) -> ControllerDef<'_, C> {
        ControllerDef {
            metadata: &mut self.metadata,
            _marker: PhantomData,
        }
    }

    pub fn class_for(&self, module_key: &str) -> Option<&ControllerClass> {
        self.modules.get(&normalize_module_key(module_key))
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &ControllerClass)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataStore {
        &mut self.metadata
    }
}

fn normalize_module_key(key: &str) -> String {
    key.replace('\\', "/").trim_matches('/').to_string()
}

/// Declaration builder returned by [`ControllerRegistry::controller`].
///
/// ```ignore
/// registry
///     .controller::<Dashboard>("admin/dashboard")
///     .annotate(ControllerOptions::new().prefix("/v2"))
///     .action(Action::get("index", Dashboard::index).with_path("/dashboard"));
/// ```
pub struct ControllerDef<'a, C> {
    metadata: &'a mut MetadataStore,
    _marker: PhantomData<C>,
}

macro_rules! def_verbs {
    ($($fn_name:ident),+ $(,)?) => {
        $(
            #[doc = concat!("Declare a `", stringify!($fn_name), "` action with a convention path.")]
            pub fn $fn_name<F, Fut, O>(self, name: impl Into<String>, handler: F) -> Self
            where
                F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = O> + Send + 'static,
                O: IntoResponse + 'static,
            {
                self.action(Action::$fn_name(name, handler))
            }
        )+
    };
}

impl<'a, C: Controller> ControllerDef<'a, C> {
    /// Annotate `C` as a controller with the given options.
    pub fn annotate(self, options: ControllerOptions) -> Self {
        self.metadata.define_controller::<C>(options);
        self
    }

    /// Append an action, keeping declaration order.
    pub fn action(self, action: Action) -> Self {
        self.metadata.push_action::<C>(action);
        self
    }

    /// Append several actions, keeping their order.
    pub fn actions(self, actions: impl IntoIterator<Item = Action>) -> Self {
        for action in actions {
            self.metadata.push_action::<C>(action);
        }
        self
    }

    def_verbs!(get, post, put, delete, head, patch, options);

    pub fn http<F, Fut, O>(self, method: &str, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: IntoResponse + 'static,
    {
        self.action(Action::http(method, name, handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_type_name_strips_path() {
        assert_eq!(short_type_name("app::api::user::User"), "User");
        assert_eq!(short_type_name("User"), "User");
        assert_eq!(
            short_type_name("app::Wrapper<app::Inner>"),
            "Wrapper<app::Inner>"
        );
    }

    #[test]
    fn module_keys_are_normalized() {
        assert_eq!(normalize_module_key("/admin/dashboard/"), "admin/dashboard");
        assert_eq!(normalize_module_key("admin\\dashboard"), "admin/dashboard");
    }

    #[test]
    fn prefix_key_is_typed() {
        let opts = ControllerOptions::new().with("prefix", "/v2").with("auth", true);
        assert_eq!(opts.prefix.as_deref(), Some("/v2"));
        assert_eq!(opts.get("auth"), Some(&Value::Bool(true)));
        assert!(opts.get("prefix").is_none());
    }
}
