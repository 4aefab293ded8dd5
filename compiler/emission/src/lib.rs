mod emission;

pub use emission::{emit, output};
