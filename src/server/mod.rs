//! HTTP binding for the field listing.
//!
//! Exposes [`FieldListing`](crate::catalog::FieldListing) as an axum
//! [`Router`](axum::Router). Binding a socket and running the server is left
//! to the host application.

pub mod routes;

pub use routes::catalog_router;
