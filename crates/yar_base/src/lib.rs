//! # yar-base
//!
//! Structural atoms for the yar compiler.
//!
//! This crate provides the foundational types used throughout the pipeline:
//!
//! - [`Pos`]/[`Span`] — 1-based source positions and ranges
//! - [`Interner`]/[`Symbol`] — string interning for O(1) name comparison
//! - [`Diagnostic`]/[`Result`] — errors with source positions
//!
//! # Design Principles
//!
//! This crate has **no knowledge of yar syntax or I/O**. It provides only
//! generic, reusable infrastructure that the syntax and compile crates build
//! upon.

pub mod error;
pub mod intern;
pub mod span;

pub use error::{Diagnostic, Result};
pub use intern::{Interner, Symbol};
pub use span::{Pos, Span};
