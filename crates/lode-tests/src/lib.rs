//! Integration and property test suite for Lode.
//!
//! Tests drive the wallet end to end against in-memory collaborators:
//! discovery over real derived addresses, planning invariants under random
//! UTXO sets, and the plan, sign and submit flow.

pub mod helpers;
