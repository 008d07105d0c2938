//! fixsbe-orchestra — FIX Orchestra repository model and SBE compiler.
//!
//! An Orchestra repository (`fixr:` namespaced XML) declares fields, code
//! sets, reusable components, repeating groups, and messages. This crate
//! lowers that declarative model into an SBE XML schema with stable wire
//! offsets:
//!
//! - [`parse::parse_repository`] builds the in-memory [`model`].
//! - [`compile::compile_to_sbe`] resolves every `componentRef`/`groupRef`
//!   eagerly into inlined field lists (downstream code sees only fields
//!   and groups, never references), picks an SBE encoding per FIX
//!   datatype, and emits the schema XML.
//!
//! The emitted schema carries `semanticType` attributes naming the
//! original FIX datatype so the loader can recover scaling, timestamp,
//! and boolean semantics without a side channel.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

/// Orchestra→SBE lowering and schema emission.
pub mod compile;
/// Crate-local error type.
pub mod error;
/// In-memory repository model.
pub mod model;
/// Orchestra XML parsing.
pub mod parse;

pub use compile::{compile_to_sbe, CompileOptions};
pub use error::OrchestraError;
pub use model::{Component, Field, Group, Message, Presence, Ref, Repository};
pub use parse::parse_repository;
