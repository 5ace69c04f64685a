pub mod observer;
pub mod outcome;
pub mod payload;
pub mod transform;

pub use observer::*;
pub use outcome::*;
pub use payload::*;
pub use transform::*;
