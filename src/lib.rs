#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod storage;
pub mod todo;
