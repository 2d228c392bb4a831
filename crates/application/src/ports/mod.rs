mod key_resolver;
mod remote_key_store;
mod static_key_source;

pub use key_resolver::{KeyResolver, Resolution, ResolutionOrigin};
pub use remote_key_store::{RemoteKeyStore, SubscriptionHandle};
pub use static_key_source::StaticKeySource;
