//! Unit tests for gatewayctl
//!
//! These tests use in-memory ports and run fast without external I/O.

mod architecture;
mod mocks;
mod orchestrator;
mod serve_session;
