//! Wire types shared between `gatewayctl` and the out-of-process front-end.
//!
//! The front-end talks to `gatewayctl serve` over JSON lines: one
//! [`UiCommand`] per stdin line, one [`UiEvent`] per stdout line.

pub mod domain;
pub mod types;

pub use domain::{DomainConfig, DomainConfigError};
pub use types::*;
