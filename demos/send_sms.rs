//! Send an SMS through any registered provider.
use serde_json::json;
use smsgate::prelude::*;

use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let provider = arg_or_env("--provider", "SMS_PROVIDER")?;
    let phone = arg_or_env("--phone", "SMS_PHONE")?;
    let text = arg_or_env("--text", "SMS_TEXT")?;

    let registry = HandlerRegistry::from_config(&config);
    let result = registry
        .send_message(&provider, &json!({ "phone": phone, "text": text }))
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn arg_or_env(flag: &str, env_key: &str) -> Result<String, String> {
    let args: Vec<String> = env::args().collect();
    if let Some(idx) = args.iter().position(|a| a == flag) {
        if idx + 1 < args.len() {
            return Ok(args[idx + 1].clone());
        }
    }
    env::var(env_key).map_err(|_| format!("missing {} (arg {} or env {})", flag, flag, env_key))
}
