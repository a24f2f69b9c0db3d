//! Application services: one module per lifecycle component.
//!
//! Each service module implements one component by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod artifacts;
pub mod challenge;
pub mod compose;
pub mod dns;
pub mod env;
pub mod network;
pub mod orchestrator;
pub mod proxy;
pub mod reconcile;
pub mod runtime;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_support;
