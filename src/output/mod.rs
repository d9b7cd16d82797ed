#![forbid(unsafe_code)]

pub mod board;
pub mod table;
