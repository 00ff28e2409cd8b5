//! Logging abstractions
//!
//! Stores take an `Arc<dyn Logger>` so the embedding application decides
//! where messages go.

mod traits;
mod noop;
mod console;

pub use traits::Logger;
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
