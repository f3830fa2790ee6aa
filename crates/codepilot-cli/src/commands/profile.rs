//! Profile command implementation.

use crate::cli::{ProfileAction, ProfileArgs, ProviderArg};
use crate::config::{Config, Profile, DEFAULT_API_KEY_ENV};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the profile command.
pub fn execute_profile(args: ProfileArgs, config: &mut Config, formatter: &Formatter) -> Result<()> {
    match args.action {
        ProfileAction::List => list_profiles(config, formatter),
        ProfileAction::Show => show_active_profile(config, formatter),
        ProfileAction::Switch { name } => switch_profile(config, name, formatter),
        ProfileAction::Set {
            name,
            provider,
            endpoint,
            model,
            api_key_env,
        } => set_profile(config, name, provider, endpoint, model, api_key_env, formatter),
        ProfileAction::Delete { name } => delete_profile(config, name, formatter),
    }
}

/// List all profiles.
fn list_profiles(config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_profiles(config)?);
    Ok(())
}

/// Show the active profile.
fn show_active_profile(config: &Config, formatter: &Formatter) -> Result<()> {
    let profile = config.get_active_profile()?;

    println!("Active profile: {}", formatter.success(&config.active_profile));
    println!("  Provider: {}", profile.provider);
    println!("  Endpoint: {}", profile.endpoint);
    println!("  Model: {}", profile.model);
    let key_state = if profile.api_key().is_some() { "set" } else { "not set" };
    println!("  API key: ${} ({})", profile.api_key_env, key_state);

    Ok(())
}

/// Switch to a different profile.
fn switch_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<()> {
    config.switch_profile(name.clone())?;
    config.save()?;
    println!(
        "{}",
        formatter.success(&format!("Switched to profile '{}'", name))
    );
    Ok(())
}

/// Create or update a profile.
fn set_profile(
    config: &mut Config,
    name: String,
    provider: ProviderArg,
    endpoint: String,
    model: String,
    api_key_env: Option<String>,
    formatter: &Formatter,
) -> Result<()> {
    let profile = Profile {
        provider: provider.into(),
        endpoint,
        model,
        api_key_env: api_key_env.unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
    };

    let action = if config.profiles.contains_key(&name) {
        "Updated"
    } else {
        "Created"
    };

    config.set_profile(name.clone(), profile);
    config.save()?;

    println!(
        "{}",
        formatter.success(&format!("{} profile '{}'", action, name))
    );

    Ok(())
}

/// Delete a profile.
fn delete_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<()> {
    if config.delete_profile(&name)? {
        config.save()?;
        println!(
            "{}",
            formatter.success(&format!("Deleted profile '{}'", name))
        );
    } else {
        println!(
            "{}",
            formatter.warning(&format!("Profile '{}' does not exist", name))
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, ProviderKind};

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        Config::default().with_path(dir.path().join("config.toml"))
    }

    #[test]
    fn test_set_and_switch_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = temp_config(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        set_profile(
            &mut config,
            "gpu".to_string(),
            ProviderArg::Ollama,
            "http://gpu:11434".to_string(),
            "codellama".to_string(),
            None,
            &formatter,
        )
        .unwrap();

        assert_eq!(config.profiles["gpu"].provider, ProviderKind::Ollama);
        assert_eq!(config.profiles["gpu"].api_key_env, DEFAULT_API_KEY_ENV);

        switch_profile(&mut config, "gpu".to_string(), &formatter).unwrap();
        assert_eq!(config.active_profile, "gpu");

        let reloaded = Config::load(config.path()).unwrap();
        assert_eq!(reloaded.active_profile, "gpu");
    }

    #[test]
    fn test_delete_active_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = temp_config(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        let result = delete_profile(&mut config, "together".to_string(), &formatter);
        assert!(result.is_err());

        delete_profile(&mut config, "local".to_string(), &formatter).unwrap();
        assert!(!config.profiles.contains_key("local"));
    }
}
