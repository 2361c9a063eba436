//! GraphQL transport: request construction, wire types, HTTP executor.

mod api_types;
mod client;
mod request;

pub use client::Client;
pub use request::{ConnectionSpec, PageRequest};
