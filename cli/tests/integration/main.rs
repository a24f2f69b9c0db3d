//! Integration tests for gatewayctl
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them needs Docker or network access.

mod cli_tests;
mod node_commands;
