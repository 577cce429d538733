mod protocol;
mod request;

pub use protocol::ProtocolDriver;
#[cfg(test)]
pub use protocol::MockProtocolDriver;
pub use request::{AsyncSender, AsyncValues, CommandRequest};
