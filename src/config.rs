use crate::directory::ConfigDirectory;
use crate::error::{ScbError, ScbResult};
use crate::markers::CONFIG_DIR_NAME;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};

const SETTINGS_REL_PATH: &str = "scbconf/config.toml";
const DEFAULT_LAUNCHER: &str = "steam";

/// Settings of the tool itself, as written in `config.toml`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub(crate) struct Settings {
    pub(crate) config_root: Option<String>,
    pub(crate) template_path: Option<String>,
    pub(crate) strict_file_names: Option<bool>,
    pub(crate) default_launcher: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EffectiveSettings {
    pub(crate) config_root: PathBuf,
    pub(crate) template_path: Option<PathBuf>,
    pub(crate) strict_file_names: bool,
    pub(crate) default_launcher: String,
}

impl EffectiveSettings {
    pub(crate) fn directory(&self) -> ConfigDirectory {
        ConfigDirectory::new(&self.config_root)
            .with_template(self.template_path.clone())
            .with_strict_file_names(self.strict_file_names)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`.
fn config_home_from(xdg: Option<String>, home: Option<String>) -> Option<PathBuf> {
    if let Some(xdg) = non_empty(xdg) {
        return Some(PathBuf::from(xdg));
    }
    non_empty(home).map(|home| PathBuf::from(home).join(".config"))
}

pub(crate) fn resolve_config_home() -> ScbResult<PathBuf> {
    config_home_from(
        std::env::var("XDG_CONFIG_HOME").ok(),
        std::env::var("HOME").ok(),
    )
    .or_else(dirs::config_dir)
    .ok_or(ScbError::ConfigHomeUnresolved)
}

fn resolve_settings_path(path_override: &Option<String>) -> ScbResult<PathBuf> {
    match path_override {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(resolve_config_home()?.join(SETTINGS_REL_PATH)),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

pub(crate) fn parse_settings(contents: &str, path: &Path) -> ScbResult<Settings> {
    toml::from_str(contents).map_err(|e| ScbError::Settings {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Missing settings file means defaults.
pub(crate) fn load_settings(path_override: &Option<String>) -> ScbResult<Settings> {
    let path = resolve_settings_path(path_override)?;
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| ScbError::io(&path, e))?;
    parse_settings(&contents, &path)
}

/// Resolves optional settings against the environment; `--root` wins over the file.
pub(crate) fn apply_settings(
    cli_root: &Option<String>,
    settings: &Settings,
) -> ScbResult<EffectiveSettings> {
    let config_root = match cli_root.as_ref().or(settings.config_root.as_ref()) {
        Some(root) => expand_home(root),
        None => resolve_config_home()?.join(CONFIG_DIR_NAME),
    };

    Ok(EffectiveSettings {
        config_root,
        template_path: settings.template_path.as_deref().map(expand_home),
        strict_file_names: settings.strict_file_names.unwrap_or(true),
        default_launcher: settings
            .default_launcher
            .clone()
            .unwrap_or_else(|| DEFAULT_LAUNCHER.to_string()),
    })
}

fn toml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn render_settings_template(settings: &Settings) -> String {
    let config_root_line = settings
        .config_root
        .as_deref()
        .map(|root| format!("config_root = {}", toml_string(root)))
        .unwrap_or_else(|| "# config_root = \"~/.config/scopebuddy\"".to_string());
    let template_line = settings
        .template_path
        .as_deref()
        .map(|path| format!("template_path = {}", toml_string(path)))
        .unwrap_or_else(|| "# template_path = \"~/.config/scbconf/template.conf\"".to_string());
    let strict_file_names = settings.strict_file_names.unwrap_or(true);
    let default_launcher = settings.default_launcher.as_deref().unwrap_or(DEFAULT_LAUNCHER);

    format!(
        r#"# scbconf settings

# ScopeBuddy config root (holds scb.conf and AppID/). Defaults to $XDG_CONFIG_HOME/scopebuddy.
{config_root_line}

# File copied into every new per-game config. Defaults to ScopeBuddy's own scb.conf template.
{template_line}

# Only allow letters, digits, '.', '_', '-' and spaces in new file names.
strict_file_names = {strict_file_names}

# Launcher folder used by `create` when none is given.
default_launcher = {default_launcher}
"#,
        default_launcher = toml_string(default_launcher),
    )
}

/// Writes a commented starter settings file. Refuses to overwrite without `force`.
pub(crate) fn write_default_settings(
    path_override: &Option<String>,
    force: bool,
) -> ScbResult<PathBuf> {
    let path = resolve_settings_path(path_override)?;
    if path.exists() && !force {
        return Err(ScbError::AlreadyExists(path));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ScbError::io(parent, e))?;
    }
    let contents = render_settings_template(&Settings::default());
    std::fs::write(&path, contents).map_err(|e| ScbError::io(&path, e))?;
    Ok(path)
}

pub(crate) fn print_kv_table(title: &str, rows: Vec<(&str, String)>) {
    println!("scbconf: {}", title);
    let key_width = rows
        .iter()
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(3)
        .max("Key".len());
    let val_width = rows
        .iter()
        .map(|(_, v)| v.len())
        .max()
        .unwrap_or(5)
        .max("Value".len());

    let sep = format!("+-{}-+-{}-+", "-".repeat(key_width), "-".repeat(val_width));
    println!("{}", sep);
    println!(
        "| {:<key_width$} | {:<val_width$} |",
        "Key",
        "Value",
        key_width = key_width,
        val_width = val_width
    );
    println!("{}", sep);
    for (k, v) in rows {
        println!(
            "| {:<key_width$} | {:<val_width$} |",
            k,
            v,
            key_width = key_width,
            val_width = val_width
        );
    }
    println!("{}", sep);
}

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "(unset)".to_string())
}

pub(crate) fn show_settings(
    path_override: &Option<String>,
    cli_root: &Option<String>,
) -> Result<(), Box<dyn Error>> {
    let path = resolve_settings_path(path_override)?;
    let settings = load_settings(path_override)?;
    let effective = apply_settings(cli_root, &settings)?;

    println!("scbconf: Settings path: {}", path.display());
    print_kv_table(
        "Effective Values (after CLI overrides)",
        vec![
            ("config_root", effective.config_root.display().to_string()),
            (
                "template_path",
                effective
                    .template_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(built-in)".to_string()),
            ),
            ("strict_file_names", effective.strict_file_names.to_string()),
            ("default_launcher", effective.default_launcher.clone()),
        ],
    );
    print_kv_table(
        "Raw Settings Values",
        vec![
            ("config_root", optional(&settings.config_root)),
            ("template_path", optional(&settings.template_path)),
            (
                "strict_file_names",
                settings
                    .strict_file_names
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "(unset)".to_string()),
            ),
            ("default_launcher", optional(&settings.default_launcher)),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_home_prefers_xdg_then_home() {
        assert_eq!(
            config_home_from(Some("/xdg".into()), Some("/home/u".into())),
            Some(PathBuf::from("/xdg"))
        );
        assert_eq!(
            config_home_from(Some(String::new()), Some("/home/u".into())),
            Some(PathBuf::from("/home/u/.config"))
        );
        assert_eq!(config_home_from(None, None), None);
    }

    #[test]
    fn cli_root_overrides_settings_file() {
        let settings = Settings {
            config_root: Some("/from/file".to_string()),
            template_path: Some("/t.conf".to_string()),
            strict_file_names: Some(false),
            default_launcher: Some("heroic".to_string()),
        };
        let effective = apply_settings(&Some("/from/cli".to_string()), &settings).unwrap();
        assert_eq!(effective.config_root, PathBuf::from("/from/cli"));
        assert_eq!(effective.template_path, Some(PathBuf::from("/t.conf")));
        assert!(!effective.strict_file_names);
        assert_eq!(effective.default_launcher, "heroic");

        let effective = apply_settings(&None, &settings).unwrap();
        assert_eq!(effective.config_root, PathBuf::from("/from/file"));
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let effective = apply_settings(&Some("/root".to_string()), &Settings::default()).unwrap();
        assert!(effective.strict_file_names);
        assert_eq!(effective.default_launcher, "steam");
        assert_eq!(effective.template_path, None);
    }

    #[test]
    fn starter_template_parses_back_to_defaults() {
        let rendered = render_settings_template(&Settings::default());
        let parsed = parse_settings(&rendered, Path::new("config.toml")).unwrap();
        assert_eq!(parsed.config_root, None);
        assert_eq!(parsed.strict_file_names, Some(true));
        assert_eq!(parsed.default_launcher.as_deref(), Some("steam"));
    }

    #[test]
    fn malformed_settings_report_path() {
        let err = parse_settings("strict_file_names = \"yes\"", Path::new("/x/config.toml"))
            .unwrap_err();
        assert!(matches!(err, ScbError::Settings { .. }));
        assert!(err.to_string().contains("/x/config.toml"));
    }

    #[test]
    fn write_default_settings_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = Some(dir.path().join("scbconf/config.toml").display().to_string());
        let written = write_default_settings(&path, false).unwrap();
        assert!(written.exists());
        assert!(matches!(
            write_default_settings(&path, false),
            Err(ScbError::AlreadyExists(_))
        ));
        write_default_settings(&path, true).unwrap();
        assert_eq!(load_settings(&path).unwrap().strict_file_names, Some(true));
    }
}
