use crate::config::ConnectionConfig;
use anyhow::Result;
use serde_json::json;

/// Handle config command
#[allow(clippy::disallowed_methods)]
pub fn handle_show_config(json: bool) -> Result<()> {
    let config = ConnectionConfig::from_env()?;

    if json {
        let value = json!({
            "host": config.host,
            "port": config.port,
            "user": config.user,
            "password": if config.password.is_empty() { "" } else { "[REDACTED]" },
            "database": config.database,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("⚙️  dbconn Configuration");
    println!("========================");
    println!("   Host:        {}", config.host);
    println!("   Port:        {}", config.port);
    println!("   User:        {}", config.user);
    println!(
        "   Password:    {}",
        if config.password.is_empty() {
            "(empty)"
        } else {
            "[REDACTED]"
        }
    );
    println!("   Database:    {}", config.database);

    Ok(())
}
