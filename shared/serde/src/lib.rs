//! # Brisk Serde
//! Positional byte serialization shared by the brisk server & client crates.
//!
//! The format is not self-describing: every value written with [`Serde::ser`]
//! must be read back with [`Serde::de`] of the same type at the same position.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod impls;
mod integer;
mod serde;

pub use byte_reader::{ByteReader, OwnedByteReader};
pub use byte_writer::{ByteCounter, ByteWrite, ByteWriter};
pub use error::SerdeErr;
pub use integer::UnsignedVariableInteger;
pub use serde::{ConstByteLength, Serde};
