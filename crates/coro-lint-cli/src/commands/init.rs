//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_NAME: &str = "coro-lint.toml";

const DEFAULT_CONFIG: &str = r#"# coro-lint configuration

# Lowest severity that fails `coro-lint check` (info, warning, error)
# fail_on = "error"

[analyzer]
# Glob patterns to exclude from analysis
exclude = [
    "**/build/**",
    "**/.gradle/**",
]

# Respect .gitignore files
respect_gitignore = true

[project]
# Library coordinates the fixes may rely on, in addition to those found in
# build.gradle(.kts) and gradle/libs.versions.toml
dependencies = []
discover_gradle = true

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.GlobalScopeUsage]
enabled = true
# severity = "warning"
# Match lifecycle owners through direct supertypes only, or the whole hierarchy
supertype_policy = "direct"

[rules.JobInBuilderUsage]
enabled = true
supertype_policy = "direct"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new("."), force)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: coro-lint check");

    Ok(())
}

fn write_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_lint_core::{Config, SupertypePolicy};

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert!(config.is_rule_enabled("GlobalScopeUsage"));
        assert!(config.project.discover_gradle);
        let rule = config.rule("JobInBuilderUsage").unwrap();
        assert_eq!(rule.supertype_policy(), SupertypePolicy::Direct);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_NAME), "# mine\n").unwrap();

        assert!(write_config(tmp.path(), false).is_err());
        let kept = std::fs::read_to_string(tmp.path().join(CONFIG_NAME)).unwrap();
        assert_eq!(kept, "# mine\n");

        write_config(tmp.path(), true).unwrap();
        let written = std::fs::read_to_string(tmp.path().join(CONFIG_NAME)).unwrap();
        assert_eq!(written, DEFAULT_CONFIG);
    }
}
