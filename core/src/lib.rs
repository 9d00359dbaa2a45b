//! populator-core: persona, consistency ledger and artifact generators
//! for populating a sandbox user profile.

pub mod artifact;
pub mod clock;
pub mod config;
pub mod error;
pub mod facts;
pub mod generators;
pub mod layout;
pub mod ledger;
pub mod money;
pub mod name_generator;
pub mod persona;
pub mod pipeline;
pub mod rng;
pub mod store;
pub mod types;
pub mod writer;
