//! HTTP types handed to controller actions and middleware.
//!
//! Everything here is re-exported from Axum so that controllers only need a
//! dependency on Wayfinder.

pub use axum::body::Body;
pub use axum::extract::Request;
pub use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
pub use axum::response::{IntoResponse, Response};
pub use axum::routing::MethodFilter;
pub use axum::{Json, Router};
