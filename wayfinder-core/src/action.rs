//! Declared controller actions.
//!
//! An [`Action`] records the verb, the optional explicit path and a typed
//! reference to the controller method that serves it. The method is captured
//! when the action is declared, so binding it to a live controller instance
//! never involves a lookup by name.

use std::any::{type_name, TypeId};
use std::future::Future;
use std::sync::Arc;

use crate::controller::ControllerInstance;
use crate::handler::{endpoint, Handler};
use crate::http::{IntoResponse, Request};

type Binder = Arc<dyn Fn(&ControllerInstance) -> Option<Handler> + Send + Sync>;

/// One HTTP-routable method of a controller.
#[derive(Clone)]
pub struct Action {
    name: String,
    method: String,
    path: Option<String>,
    controller: TypeId,
    controller_name: &'static str,
    binder: Binder,
}

macro_rules! verb_constructors {
    ($($fn_name:ident => $verb:literal),+ $(,)?) => {
        $(
            #[doc = concat!("Declare a `", $verb, "` action served by `handler`.")]
            pub fn $fn_name<C, F, Fut, O>(name: impl Into<String>, handler: F) -> Self
            where
                C: Send + Sync + 'static,
                F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = O> + Send + 'static,
                O: IntoResponse + 'static,
            {
                Self::http($verb, name, handler)
            }
        )+
    };
}

impl Action {
    verb_constructors! {
        get => "GET",
        post => "POST",
        put => "PUT",
        delete => "DELETE",
        head => "HEAD",
        patch => "PATCH",
        options => "OPTIONS",
    }

    /// Declare an action for an arbitrary verb.
    ///
    /// The verb is upper-cased here. It is not validated: a verb the router
    /// cannot register surfaces as [`LoadError::UnsupportedMethod`](crate::LoadError::UnsupportedMethod)
    /// when the action is registered.
    pub fn http<C, F, Fut, O>(method: &str, name: impl Into<String>, handler: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: IntoResponse + 'static,
    {
        let handler = Arc::new(handler);
        let binder: Binder = Arc::new(move |instance: &ControllerInstance| {
            let controller = Arc::clone(instance).downcast::<C>().ok()?;
            let handler = Arc::clone(&handler);
            Some(endpoint(move |req| handler(Arc::clone(&controller), req)))
        });

        Self {
            name: name.into(),
            method: method.to_uppercase(),
            path: None,
            controller: TypeId::of::<C>(),
            controller_name: type_name::<C>(),
            binder,
        }
    }

    /// Set an explicit route path. An empty path means "no explicit path".
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.is_empty() { None } else { Some(path) };
        self
    }

    /// Name of the controller method serving this action.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upper-case HTTP verb.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Explicit route path, if one was declared.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Type of the controller this action was declared against.
    pub fn controller_type(&self) -> TypeId {
        self.controller
    }

    /// Bind the action to a controller instance, producing the terminal
    /// handler of its middleware chain.
    ///
    /// Returns `None` when `instance` is not of the declared controller type.
    pub fn bind(&self, instance: &ControllerInstance) -> Option<Handler> {
        (self.binder)(instance)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("controller", &self.controller_name)
            .finish()
    }
}
