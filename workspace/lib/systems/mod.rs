//! Collection of pre-defined systems.

pub mod fair_test;
pub mod cat;
pub mod qubit;
pub mod lazarus;
pub mod slit;
