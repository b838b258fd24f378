//! Key command - show the cache key a job would use

use crate::cache::{build_key, CacheKind, KeyEnvironment};
use crate::cli::args::{GlobalArgs, KeyArgs, OutputFormat};
use crate::config::Config;
use crate::environment::Inputs;
use crate::error::CacheResult;

/// Execute the key command
pub async fn execute(args: KeyArgs, global: &GlobalArgs, config: &Config) -> CacheResult<()> {
    let kind = CacheKind::parse(&args.cache)?;
    let inputs = Inputs::resolve(&config.inputs, &global.inputs);
    let key_env = KeyEnvironment::from_env(&inputs, config.cache.key_prefix.as_deref());
    let cache_key = build_key(kind.name(), &key_env);

    match args.format {
        OutputFormat::Plain => {
            println!("{}", cache_key.key);
            for restore_key in &cache_key.restore_keys {
                println!("{}", restore_key);
            }
        }
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            struct KeyJson<'a> {
                cache: &'a str,
                #[serde(flatten)]
                key: &'a crate::cache::CacheKey,
            }

            let json = serde_json::to_string_pretty(&KeyJson {
                cache: kind.name(),
                key: &cache_key,
            })?;
            println!("{}", json);
        }
    }

    Ok(())
}
