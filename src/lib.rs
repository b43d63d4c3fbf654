//! Core engine for `drk`: a declarative database workload simulator.
//!
//! Given a YAML configuration of activities and workflows, the engine
//! runs the described load against a relational database for a bounded
//! duration, emitting per-operation timing events for observation. The
//! process entry point, driver adapters, and live monitor are glue built
//! on top of this crate (see `src/bin/drk`).

#[macro_use]
extern crate async_trait;

pub mod argument;
pub mod configuration;
pub mod database;
pub mod error;
pub mod event;
pub mod execute;
pub mod generators;
pub mod rate;
pub mod runner;
pub mod sampler;
pub mod value;
pub mod vu;
pub mod weighted;
pub mod workflow;
