//! # lode-core
//! Foundation types, address encodings and collaborator traits for Lode.

pub mod address;
pub mod constants;
pub mod error;
pub mod fee;
pub mod traits;
pub mod types;
