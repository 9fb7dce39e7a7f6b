//! The `redpen init` command.

use anyhow::Result;

use redpen_providers::config::STARTER_CONFIG;

pub fn execute() -> Result<()> {
    if std::path::Path::new("redpen.toml").exists() {
        println!("redpen.toml already exists, skipping.");
    } else {
        std::fs::write("redpen.toml", STARTER_CONFIG)?;
        println!("Created redpen.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export REDPEN_API_KEY to enable remote generation (optional)");
    println!("  2. Run: redpen generate --subject \"Computer Science\"");
    println!("  3. Fill in the answers file, then run: redpen evaluate --assessment <file> --answers <file>");

    Ok(())
}
