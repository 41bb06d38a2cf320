//! Command modules - one file per CLI command

pub mod completions;
pub mod info;
pub mod libs;
pub mod push;
