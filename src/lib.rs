//! nodefix - Library for canonicalizing node class identifiers
//!
//! This library provides functionality to:
//! - Resolve the registry of valid identifiers from a module search path or
//!   a well-known file under installation roots (static manifests only)
//! - Match requested logical names to canonical registry keys and build a
//!   case-insensitive table of known historical variants
//! - Rewrite workflow documents through that table, backing each one up
//!   before it is overwritten
//! - Apply ordered regex substitutions to plain source files

pub mod alias;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod patch;
pub mod pipeline;
pub mod registry;
pub mod report;
