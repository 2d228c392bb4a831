use keycache_domain::{CliOverrides, Config};
use tracing::info;

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;

    info!(
        config_file = config_path.unwrap_or("default"),
        documents = config.remote.documents_path.as_deref().unwrap_or("in-memory"),
        default_ttl_secs = config.cache.default_ttl_secs,
        static_fallback = config.fallback.enabled,
        "Configuration loaded"
    );

    Ok(config)
}
