use anyhow::Result;

use crate::Context;
use crate::commands::load_config;
use crate::paths;
use crate::ui;

pub fn show(ctx: &Context) -> Result<()> {
    let path = paths::config_file(ctx.config_override.as_deref())?;
    let config = load_config(ctx)?.masked();

    if !ctx.quiet {
        ui::header("Configuration");
        ui::kv("File", &path.display().to_string());
        if !path.exists() {
            ui::info("File not found, showing defaults");
        }
        println!();
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path(ctx: &Context) -> Result<()> {
    let path = paths::config_file(ctx.config_override.as_deref())?;
    println!("{}", path.display());
    Ok(())
}
