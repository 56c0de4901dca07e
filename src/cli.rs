use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Enable verbose debug output.
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,
    /// Enable diagnostic logging to a file.
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) debug: bool,
    /// Path to debug log file (used with --debug). Overrides SCBCONF_DEBUG_LOG.
    #[arg(long, global = true)]
    pub(crate) debug_log: Option<String>,
    /// Path to a settings file (TOML). Defaults to $XDG_CONFIG_HOME/scbconf/config.toml.
    #[arg(long, global = true)]
    pub(crate) config: Option<String>,
    /// ScopeBuddy config root. Overrides `config_root` from the settings file.
    #[arg(long, global = true)]
    pub(crate) root: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Create the global scb.conf if missing and repair its gamescope line.
    Init,
    /// List launcher folders and their config files.
    List {
        /// Print the full config tree as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show every field of one config file.
    Show {
        /// `global`, `<launcher>/<file>` or a path.
        #[arg(default_value = "global")]
        target: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Create a per-game config file from the template.
    Create {
        /// File name, usually the game's AppID. `.conf` is appended when missing.
        file: String,
        /// Launcher folder under AppID. Defaults to `default_launcher` from the settings.
        #[arg(long)]
        launcher: Option<String>,
        /// Display name written to line 1.
        #[arg(long)]
        name: Option<String>,
    },
    /// Create an empty launcher folder under AppID.
    CreateLauncher { name: String },
    /// Delete a config file, or a whole launcher folder with --launcher.
    Remove {
        target: String,
        /// Treat TARGET as a launcher folder name.
        #[arg(long, default_value_t = false)]
        launcher: bool,
    },
    /// Change a file's display name.
    Rename { target: String, name: String },
    /// Print the active export lines, or replace them with VALUES.
    Exports {
        target: String,
        /// `NAME=value` entries; the file ends up exporting exactly these.
        values: Vec<String>,
        /// Remove every export line.
        #[arg(long, default_value_t = false, conflicts_with = "values")]
        clear: bool,
    },
    /// Edit the SCB_GAMESCOPE_ARGS line.
    Gamescope {
        target: String,
        #[command(flatten)]
        options: GamescopeOptions,
    },
    /// Print the Steam-style launch options, or replace them.
    Launch {
        target: String,
        /// Options appended to the game command, e.g. `-novid -console`.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
        /// Empty the launch options.
        #[arg(long, default_value_t = false, conflicts_with = "options")]
        clear: bool,
    },
    /// Replace the first line starting with each --prefix by the matching --with.
    ReplaceLines {
        target: String,
        /// Line prefix to look for. Repeatable.
        #[arg(long = "prefix", required = true)]
        prefixes: Vec<String>,
        /// Replacement for the prefix at the same position. Repeatable.
        #[arg(long = "with", allow_hyphen_values = true)]
        replacements: Vec<String>,
    },
    /// Turn a ScopeBuddy switch on or off.
    Flag {
        target: String,
        flag: FlagName,
        state: Switch,
        /// Enable gamescope even when a MangoHUD export is present.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Create a starter settings file.
    ConfigInit {
        /// Overwrite existing settings if present.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print resolved settings (path + values).
    ConfigShow,
}

#[derive(Args, Debug, Default)]
pub(crate) struct GamescopeOptions {
    /// Store the args but disable the line.
    #[arg(long, default_value_t = false, conflicts_with = "enable")]
    pub(crate) disable: bool,
    /// Activate the line, restoring the stored args.
    #[arg(long, default_value_t = false)]
    pub(crate) enable: bool,
    /// Start from empty args instead of the stored ones.
    #[arg(long, default_value_t = false)]
    pub(crate) clear: bool,
    /// Enable gamescope even when a MangoHUD export is present.
    #[arg(long, default_value_t = false)]
    pub(crate) force: bool,
    /// Internal render width (-w).
    #[arg(long)]
    pub(crate) render_width: Option<u32>,
    /// Internal render height (-h).
    #[arg(long)]
    pub(crate) render_height: Option<u32>,
    /// Output width (-W).
    #[arg(long)]
    pub(crate) output_width: Option<u32>,
    /// Output height (-H).
    #[arg(long)]
    pub(crate) output_height: Option<u32>,
    /// Frame rate limit (-r).
    #[arg(long)]
    pub(crate) fps: Option<u32>,
    /// Maximum scale factor (-m).
    #[arg(long)]
    pub(crate) max_scale: Option<u32>,
    /// Upscaler type (-S).
    #[arg(long, value_parser = ["auto", "integer", "fit", "fill", "stretch"])]
    pub(crate) scaler: Option<String>,
    /// Upscaler filter (-F).
    #[arg(long, value_parser = ["linear", "nearest", "fsr", "nis", "pixel"])]
    pub(crate) filter: Option<String>,
    /// Upscaler sharpness (--sharpness).
    #[arg(long)]
    pub(crate) sharpness: Option<u32>,
    /// Mouse sensitivity multiplier (-s).
    #[arg(long)]
    pub(crate) mouse_sensitivity: Option<f64>,
    /// Fullscreen (-f).
    #[arg(long, default_value_t = false)]
    pub(crate) fullscreen: bool,
    /// Borderless window (-b).
    #[arg(long, default_value_t = false)]
    pub(crate) borderless: bool,
    /// Steam integration (-e).
    #[arg(long, default_value_t = false)]
    pub(crate) steam: bool,
    /// HDR (--hdr-enabled).
    #[arg(long, default_value_t = false)]
    pub(crate) hdr: bool,
    /// MangoHUD through gamescope (--mangoapp).
    #[arg(long, default_value_t = false)]
    pub(crate) mangoapp: bool,
    /// Variable refresh rate (--adaptive-sync).
    #[arg(long, default_value_t = false)]
    pub(crate) adaptive_sync: bool,
    /// --force-windows-fullscreen.
    #[arg(long, default_value_t = false)]
    pub(crate) force_windows_fullscreen: bool,
    /// --force-grab-cursor.
    #[arg(long, default_value_t = false)]
    pub(crate) force_grab_cursor: bool,
    /// Unset a known option by field name (e.g. `fps`, `fullscreen`). Repeatable.
    #[arg(long = "unset", value_name = "FIELD")]
    pub(crate) unset: Vec<String>,
    /// Replacement for the args gamescope does not have a dedicated option for.
    #[arg(last = true)]
    pub(crate) extra: Vec<String>,
}

impl GamescopeOptions {
    /// `(flag, value)` pairs for every option given on the command line.
    pub(crate) fn assignments(&self) -> Vec<(&'static str, String)> {
        let numbers = [
            ("-w", self.render_width),
            ("-h", self.render_height),
            ("-W", self.output_width),
            ("-H", self.output_height),
            ("-r", self.fps),
            ("-m", self.max_scale),
            ("--sharpness", self.sharpness),
        ];
        let switches = [
            ("-f", self.fullscreen),
            ("-b", self.borderless),
            ("-e", self.steam),
            ("--hdr-enabled", self.hdr),
            ("--mangoapp", self.mangoapp),
            ("--adaptive-sync", self.adaptive_sync),
            ("--force-windows-fullscreen", self.force_windows_fullscreen),
            ("--force-grab-cursor", self.force_grab_cursor),
        ];

        let mut out: Vec<(&'static str, String)> = numbers
            .into_iter()
            .filter_map(|(flag, value)| value.map(|v| (flag, v.to_string())))
            .collect();
        if let Some(scaler) = &self.scaler {
            out.push(("-S", scaler.clone()));
        }
        if let Some(filter) = &self.filter {
            out.push(("-F", filter.clone()));
        }
        if let Some(sensitivity) = self.mouse_sensitivity {
            out.push(("-s", sensitivity.to_string()));
        }
        out.extend(
            switches
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(flag, _)| (flag, String::new())),
        );
        out
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlagName {
    /// SCB_NOSCOPE: run the game without gamescope.
    Noscope,
    /// SCB_AUTO_RES, SCB_AUTO_HDR and SCB_AUTO_VRR.
    Auto,
    /// SCB_DEBUG: ScopeBuddy writes its command to scopebuddy.log.
    Debug,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Switch {
    On,
    Off,
}
