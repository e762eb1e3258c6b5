//! Pythia: commit-reveal oracle feeder voter

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, trivial_casts, unused_qualifications)]

pub mod application;
pub mod commands;
pub mod config;
pub mod error;
pub mod http_client;
pub mod networks;
pub mod prelude;
pub mod rate;
pub mod sources;
pub mod wallet;

pub use self::{
    error::{Error, ErrorKind},
    networks::terra::Denom,
    rate::Rate,
};

pub use std::collections::{btree_map as map, BTreeMap as Map};
