//! crafttree: crafting recipes and tech trees derived from a game's
//! object/transition graph.
//!
//! Layers, inner to outer:
//! - [`domain`]: object graph, difficulty classifier, recipe and tech-tree derivation
//! - [`application`]: content loading, version classification, JSON export
//! - [`infrastructure`]: I/O traits and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
