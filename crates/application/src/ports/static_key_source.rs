/// Statically configured key-value source (deployment environment, fixed map).
///
/// Lookups are synchronous and never touch the network.
pub trait StaticKeySource: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}
