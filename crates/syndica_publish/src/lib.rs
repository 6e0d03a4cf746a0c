//! Container-based publish protocol for syndica.
//!
//! Some platforms stage each media item in a server-side "container"
//! that must reach a ready state before publishing; multiple items are
//! grouped into a carousel container and published as one post. This
//! crate defines the protocol trait, an HTTP client for Graph-style
//! APIs, and the [`ContainerPublisher`] that drives the full sequence.

#![warn(missing_docs)]

mod api;
mod http;
mod publisher;

pub use api::{ContainerApi, ContainerResult, ContainerStatus, PublishedPost};
pub use http::GraphContainerApi;
pub use publisher::ContainerPublisher;
