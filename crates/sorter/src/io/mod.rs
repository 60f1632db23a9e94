pub mod sources;
pub mod sink;

pub use sources::*;
pub use sink::*;
