//! IO modules - local side effects (archive reading, staging)

pub mod archive;
pub mod extract;
