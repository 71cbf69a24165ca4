//! `oscopilot tools`: list the registered tools.

use oscopilot_agent::display_name;
use oscopilot_config::AppConfig;

pub fn run(config: &AppConfig) {
    let registry = oscopilot_tools::default_registry(&config.data_sources);

    println!("Available tools ({}):\n", registry.len());
    for def in registry.definitions() {
        println!("  {:<28} {}", def.name, display_name(&def.name));
        println!("  {:<28} {}\n", "", first_line(&def.description));
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
