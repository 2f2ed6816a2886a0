mod borrowed;
mod kind;
mod nom_parser;
mod parse;
mod serialize;
pub mod tags;
mod types;

pub use self::borrowed::MessageRef;
pub use self::kind::{strip_identify_msg_marker, MessageFlag, MessageKind};
pub use self::types::{Message, Tag};
