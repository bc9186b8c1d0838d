//! pfptmeta core
//!
//! Provider-agnostic building blocks: resource values, attribute schemas,
//! JSON mapping, change detection, and the Provider trait.

pub mod attachment;
pub mod differ;
pub mod mapper;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod validation;
