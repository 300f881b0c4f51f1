//! Remote API access
//!
//! [`ApiClient`] lists resources over HTTP with bearer-token
//! authentication. The informer depends only on [`ListSource`], so tests
//! can substitute an in-memory source.

pub mod api;
pub mod credentials;
pub mod errors;
pub mod http;

pub use api::{ApiClient, ListSource};
pub use credentials::Credentials;
pub use errors::ClientError;
pub use http::{HttpClient, HttpClientBuilder};
