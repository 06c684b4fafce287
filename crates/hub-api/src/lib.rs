//! ForgeHub API Server
//!
//! The HTTP boundary of ForgeHub: dataset metadata endpoints backed by the
//! refresh-and-cache pipeline, and a streaming proxy path for raw file
//! bytes. Components are explicitly constructed and injected through
//! [`AppState`]; there is no ambient global state.

pub mod auth;
pub mod error;
pub mod routes;
pub mod service;

pub use error::ApiError;
pub use routes::{router, AppState};
pub use service::DatasetService;
