mod bounds;

pub use bounds::*;
