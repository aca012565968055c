pub mod client;
pub mod framing;
pub mod registry;
pub mod scanner;
