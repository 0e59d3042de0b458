#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

pub mod approx;
pub mod eval;
pub mod field;
pub mod meas;
pub mod sim;
pub mod track;
