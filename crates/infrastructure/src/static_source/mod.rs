// StaticKeySource adapters

pub mod env;
pub mod map;

pub use env::EnvKeySource;
pub use map::{LayeredKeySource, MapKeySource};
