pub mod channel;
pub mod consumer;
pub mod measurement;

pub use channel::*;
pub use consumer::*;
pub use measurement::*;
