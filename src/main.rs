mod cli;
mod conf_file;
mod config;
mod directory;
mod error;
mod gamescope;
mod logging;
mod markers;
mod rewrite;
mod types;

use clap::Parser;
use cli::{Cli, Commands, FlagName, GamescopeOptions, Switch};
use conf_file::{ConfigFile, Flag};
use config::{EffectiveSettings, print_kv_table};
use directory::ConfigDirectory;
use error::ScbError;
use gamescope::{GamescopeArgs, KNOWN_ARGS};
use std::error::Error;
use std::fmt;
use std::path::Path;
use types::{ConfigNode, FileSnapshot};

#[derive(Debug)]
struct CliError(String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for CliError {}

/// Resolved settings plus the directory they point at.
struct Session {
    settings: EffectiveSettings,
    directory: ConfigDirectory,
}

impl Session {
    fn load(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let settings = config::load_settings(&cli.config)?;
        let settings = config::apply_settings(&cli.root, &settings)?;
        tracing::debug!(root = %settings.config_root.display(), "resolved config root");
        let directory = settings.directory();
        Ok(Session {
            settings,
            directory,
        })
    }

    fn open(&self, target: &str) -> Result<ConfigFile, Box<dyn Error>> {
        Ok(self.directory.open(target)?)
    }
}

fn report(changed: bool, path: &Path, what: &str) {
    if changed {
        println!("scbconf: Updated {} in {}", what, path.display());
    } else {
        println!("scbconf: {} already up to date in {}", what, path.display());
    }
}

/// Gamescope cannot be enabled next to a MangoHUD export unless forced.
fn guard_mangohud(file: &ConfigFile, force: bool) -> Result<(), Box<dyn Error>> {
    if !file.has_mangohud_export()? {
        return Ok(());
    }
    if force {
        eprintln!(
            "scbconf: Warning: {} exports MangoHUD; with gamescope use --mangoapp instead.",
            file.path().display()
        );
        return Ok(());
    }
    Err(CliError(format!(
        "{} exports MangoHUD, which breaks under gamescope. Use `gamescope --mangoapp` instead, or pass --force.",
        file.path().display()
    ))
    .into())
}

fn on_off(on: bool) -> String {
    if on { "on" } else { "off" }.to_string()
}

fn print_snapshot(snapshot: &FileSnapshot) {
    let exports = if snapshot.exports.is_empty() {
        "(none)".to_string()
    } else {
        snapshot.exports.join(", ")
    };
    print_kv_table(
        &snapshot.display_name,
        vec![
            ("path", snapshot.path.display().to_string()),
            ("exports", exports),
            ("gamescope_active", snapshot.gamescope.active.to_string()),
            ("gamescope_args", snapshot.gamescope.args.clone()),
            (
                "stored_gamescope_args",
                snapshot.stored_gamescope_args.clone().unwrap_or_default(),
            ),
            ("launch_options", snapshot.launch_options.clone()),
            ("noscope", on_off(snapshot.flags.noscope)),
            ("auto_res", on_off(snapshot.flags.auto_res)),
            ("auto_hdr", on_off(snapshot.flags.auto_hdr)),
            ("auto_vrr", on_off(snapshot.flags.auto_vrr)),
            ("debug", on_off(snapshot.flags.debug)),
        ],
    );

    let args = snapshot
        .stored_gamescope_args
        .as_deref()
        .map(GamescopeArgs::parse)
        .unwrap_or_default();
    let mut rows = args.rows();
    if !args.extra.is_empty() {
        rows.push(("extra", shell_words::join(&args.extra)));
    }
    if !rows.is_empty() {
        print_kv_table("Gamescope Options", rows);
    }
}

fn list(session: &Session, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let tree: ConfigNode = session.directory.scan()?;
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    let global = session.directory.global_config_path();
    if global.is_file() {
        println!("global\t{}", markers::GLOBAL_DISPLAY_NAME);
    }
    for (launcher, entries) in session.directory.launcher_groups()? {
        if entries.is_empty() {
            println!("{}/", launcher);
        }
        for entry in entries {
            println!("{}/{}\t{}", launcher, entry.file_name, entry.display_name);
        }
    }
    Ok(())
}

fn edit_gamescope(
    session: &Session,
    target: &str,
    options: &GamescopeOptions,
) -> Result<(), Box<dyn Error>> {
    let file = session.open(target)?;
    let current = file.gamescope_args()?;
    let active = if options.disable {
        false
    } else {
        options.enable || current.active
    };
    if active && !current.active {
        guard_mangohud(&file, options.force)?;
    }

    let assignments = options.assignments();
    let toggle_only = assignments.is_empty()
        && options.unset.is_empty()
        && options.extra.is_empty()
        && !options.clear;
    if toggle_only {
        let changed = file.set_gamescope_active(active)?;
        report(changed, file.path(), "gamescope state");
        return Ok(());
    }

    let stored = file.stored_gamescope_args()?.unwrap_or_default();
    let mut args = GamescopeArgs::parse(&stored);
    if options.clear {
        args.clear();
    }
    for (flag, value) in assignments {
        args.set(flag, Some(value.as_str()))?;
    }
    for field in &options.unset {
        let spec = KNOWN_ARGS
            .iter()
            .find(|spec| spec.field == field.replace('-', "_"))
            .ok_or_else(|| CliError(format!("Unknown gamescope option '{}'.", field)))?;
        args.set(spec.flag, None)?;
    }
    if !options.extra.is_empty() {
        args.extra = options.extra.clone();
    }
    args.validate()?;

    let rendered = args.render();
    let changed = file.set_gamescope_line(&rendered, active)?;
    report(changed, file.path(), "gamescope args");
    if !active {
        println!("scbconf: Gamescope line is disabled; pass --enable to activate it.");
    }
    Ok(())
}

fn set_flag(
    session: &Session,
    target: &str,
    flag: FlagName,
    state: Switch,
    force: bool,
) -> Result<(), Box<dyn Error>> {
    let file = session.open(target)?;
    let on = state == Switch::On;
    let flag = match flag {
        FlagName::Noscope => Flag::Noscope,
        FlagName::Auto => Flag::Auto,
        FlagName::Debug => Flag::Debug,
    };
    if flag == Flag::Noscope && !on {
        guard_mangohud(&file, force)?;
    }
    let changed = file.set_flag(flag, on)?;
    report(changed, file.path(), "flag");
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Commands::ConfigInit { force } => {
            let path = config::write_default_settings(&cli.config, *force)?;
            println!("scbconf: Wrote settings to {}", path.display());
            Ok(())
        }
        Commands::ConfigShow => config::show_settings(&cli.config, &cli.root),
        command => {
            let session = Session::load(cli)?;
            run_with_session(&session, command)
        }
    }
}

fn run_with_session(session: &Session, command: &Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Init => {
            let global = session.directory.ensure_global_config()?;
            println!(
                "scbconf: Config root {}",
                session.directory.root().display()
            );
            println!("scbconf: Global config ready at {}", global.path().display());
            Ok(())
        }
        Commands::List { json } => list(session, *json),
        Commands::Show { target, json } => {
            let snapshot = session.open(target)?.snapshot()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
            Ok(())
        }
        Commands::Create {
            file,
            launcher,
            name,
        } => {
            let launcher = launcher
                .as_deref()
                .unwrap_or(&session.settings.default_launcher);
            let path = session.directory.create_file(
                file,
                name.as_deref().unwrap_or(""),
                Path::new(launcher),
            )?;
            println!("scbconf: Created {}", path.display());
            Ok(())
        }
        Commands::CreateLauncher { name } => {
            let path = session.directory.create_launcher(name)?;
            println!("scbconf: Created launcher folder {}", path.display());
            Ok(())
        }
        Commands::Remove { target, launcher } => {
            if *launcher {
                session.directory.remove_launcher(target)?;
                println!("scbconf: Removed launcher folder '{}'", target);
            } else {
                let file = session.open(target)?;
                session.directory.remove_file(&file)?;
                println!("scbconf: Removed {}", file.path().display());
            }
            Ok(())
        }
        Commands::Rename { target, name } => {
            let file = session.open(target)?;
            let changed = file.set_display_name(name)?;
            report(changed, file.path(), "display name");
            Ok(())
        }
        Commands::Exports {
            target,
            values,
            clear,
        } => {
            let file = session.open(target)?;
            if values.is_empty() && !*clear {
                for line in file.export_lines()? {
                    println!("{}", line);
                }
                return Ok(());
            }
            let changed = file.set_export_lines(values)?;
            report(changed, file.path(), "export lines");
            Ok(())
        }
        Commands::Gamescope { target, options } => edit_gamescope(session, target, options),
        Commands::ReplaceLines {
            target,
            prefixes,
            replacements,
        } => {
            let file = session.open(target)?;
            let changed = file.edit_exact_lines(prefixes, replacements)?;
            report(changed, file.path(), "lines");
            Ok(())
        }
        Commands::Launch {
            target,
            options,
            clear,
        } => {
            let file = session.open(target)?;
            if options.is_empty() && !*clear {
                println!("{}", file.launch_options()?);
                return Ok(());
            }
            let changed = file.set_launch_options(&options.join(" "))?;
            report(changed, file.path(), "launch options");
            Ok(())
        }
        Commands::Flag {
            target,
            flag,
            state,
            force,
        } => set_flag(session, target, *flag, *state, *force),
        Commands::ConfigInit { .. } | Commands::ConfigShow => Ok(()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.debug, &cli.debug_log)?;

    if let Err(err) = run(&cli) {
        if let Some(scb) = err.downcast_ref::<ScbError>() {
            if scb.is_validation() {
                eprintln!("scbconf: Rejected: {}", scb);
                std::process::exit(2);
            }
            if scb.is_not_found() {
                eprintln!("scbconf: {}", scb);
                std::process::exit(3);
            }
        }
        tracing::error!(error = %err, "command failed");
        return Err(err);
    }
    Ok(())
}
