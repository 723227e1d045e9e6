pub mod commands;
pub mod engine;
pub mod fetch;
pub mod local;
pub mod mock;
pub mod thread;

#[cfg(test)]
mod test_server;

pub use commands::Timeline;
pub use engine::MediaEngine;
pub use local::LocalEngine;
pub use mock::{MockEngine, MockEngineBuilder};
