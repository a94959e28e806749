//! Everything needed to declare controllers and run the loader.
//!
//! ```ignore
//! use wayfinder::prelude::*;
//! ```

pub use crate::action::Action;
pub use crate::collector::{CollectContext, MiddlewareCollector};
pub use crate::config::LoaderSettings;
pub use crate::controller::{
    ConstructOptions, Controller, ControllerOptions, ControllerRegistry,
};
pub use crate::error::{HttpError, LoadError};
pub use crate::handler::{endpoint, from_fn, Handler, Next};
pub use crate::http::{IntoResponse, Json, Request, Response, StatusCode};
pub use crate::loader::{LoadSummary, Loader};
pub use crate::logging::init_tracing;
pub use crate::options::{FileFilter, LoaderOptions};
pub use crate::router::{AxumRouter, RouteTarget};
