pub mod achievement;
pub mod chain;
pub mod entity;
pub mod events;
pub mod game;
pub mod pin;
pub mod query;
pub mod registry;
pub mod social;
pub mod trophies;

pub use achievement::*;
pub use chain::*;
pub use entity::{Entity, Fields, ParseError, is_zero_felt, pad_address};
pub use events::*;
pub use game::*;
pub use pin::*;
pub use query::*;
pub use registry::*;
pub use social::*;
