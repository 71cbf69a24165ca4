//! `oscopilot doctor`: diagnose configuration and provider health.

use oscopilot_config::AppConfig;
use std::path::PathBuf;

pub async fn run(config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    println!("🩺 OpenSource Copilot Doctor");
    println!("============================\n");

    let mut issues = 0;

    let path = config_path
        .cloned()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults", path.display());
    }

    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            anyhow::bail!("configuration invalid");
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key: set OSCOPILOT_API_KEY or OPENAI_API_KEY");
        issues += 1;
    }

    if config.data_sources.github_token.is_some() {
        println!("  ✅ GitHub token configured");
    } else {
        println!("  ⚠️  No GITHUB_TOKEN: GitHub requests are rate limited");
        issues += 1;
    }

    match oscopilot_providers::build_from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ❌ Provider '{}' not healthy", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Provider not usable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
