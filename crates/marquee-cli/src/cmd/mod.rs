//! Command modules - one file per CLI command

pub mod demo;
pub mod run;
