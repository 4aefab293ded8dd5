mod ast_def;

pub use ast_def::*;
