#![allow(dead_code, non_snake_case, non_upper_case_globals)]

pub mod utils;
pub mod error;
pub mod config;
pub mod decay;
pub mod collapse;
pub mod density;
pub mod wavepacket;
pub mod mcwf;
pub mod models;
pub mod report;

pub use error::{ DtcError, DtcResult };
