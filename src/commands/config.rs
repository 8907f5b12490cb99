//! Config subcommands handler

use anyhow::Result;

use fieldcat::config::Config;

/// Show current configuration as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = Config::load()?;
    print!("{}", render(&config)?);
    Ok(())
}

/// Print the config file location.
#[cfg(not(tarpaulin_include))]
pub fn handle_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Write a default config file unless one exists.
#[cfg(not(tarpaulin_include))]
pub fn handle_init() -> Result<()> {
    let config_path = Config::config_path()?;
    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
        return Ok(());
    }
    Config::default().save()?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}

fn render(config: &Config) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
