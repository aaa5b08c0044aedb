//! Line-framed s-expression protocol between the landmark detector and
//! whatever renders or records the labels.

pub mod dispatch;
pub mod server;

pub use dispatch::handle_message;
pub use server::{StreamServer, StreamStats};
