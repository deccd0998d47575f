//! Plugin catalog listing.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use iacscan_engine::plugins::discover_plugins;

#[derive(Args)]
pub struct PluginsArgs {
    /// Also print each backend's default configuration.
    #[arg(long)]
    pub show_config: bool,
}

pub fn execute(args: PluginsArgs) -> Result<()> {
    let registry = discover_plugins()?;

    println!(
        "{}",
        format!("🔌 Registered backends ({})", registry.len())
            .bright_blue()
            .bold()
    );
    println!("{}", "=".repeat(50).bright_blue());

    for descriptor in registry.list() {
        println!("\n{}", descriptor.name.bold());
        println!("   {}", descriptor.description);
        if !descriptor.capabilities.supports.is_empty() {
            println!(
                "   Supports: {}",
                descriptor.capabilities.supports.join(", ")
            );
        }
        if !descriptor.capabilities.features.is_empty() {
            println!(
                "   Features: {}",
                descriptor.capabilities.features.join(", ")
            );
        }
        if args.show_config && !descriptor.default_config.is_empty() {
            println!(
                "   Default config: {}",
                serde_json::to_string(&descriptor.default_config)?
            );
        }
    }

    Ok(())
}
