mod command_value;
mod value_type;

pub use command_value::{CommandValue, FromCommandValue};
pub use value_type::ValueType;
