//! Barrier generation for grouped streams.
//!
//! A [`runtime::BarrierNode`] sits between a grouped input edge and a set of output
//! channels. For every group it sees, it starts a background emitter that injects
//! [`api::element::Barrier`] elements into the outputs, either after the group has been
//! idle for a while or on a fixed period.

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate anyhow;

pub mod api;
pub mod channel;
pub mod metrics;
pub mod runtime;
pub mod utils;
