pub mod dict_map;
pub mod edit;
pub mod exchange;
pub mod item;
pub mod journal;
pub mod reorder;
pub mod settings;
pub mod store;
pub mod sync;

pub use dict_map::DictMap;
pub use edit::EditOp;
pub use item::{CodecError, Entry, Triple};
