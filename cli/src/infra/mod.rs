//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, HTTP, DNS, the registrar API, firewall and router control.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod dns;
pub mod firewall;
pub mod fs;
pub mod http;
pub mod namecheap;
pub mod runtime_host;
pub mod system;
pub mod upnp;
