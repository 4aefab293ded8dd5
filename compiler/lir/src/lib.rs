mod lir_def;

pub use lir_def::*;
