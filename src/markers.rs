//! Byte-level vocabulary of ScopeBuddy config files.
//!
//! Every marker, directive key and policy literal written to or matched in a
//! `.conf` file lives here, so a format change touches one place.

/// Prefix for lines commented out by this tool.
pub(crate) const MACHINE_MARKER: &str = "#SCBGUI#";

/// Prefix for malformed lines disabled before they can break the shell script.
pub(crate) const ERROR_MARKER: &str = "#SCBGUI_ERROR_PREVENTATION!#";

/// Marker written by early releases of the GUI. Recognized, never written.
pub(crate) const LEGACY_MARKER: &str = "# commented out by scopebuddy-gui: ";

pub(crate) const COMMENT: &str = "#";

pub(crate) const GAMESCOPE_KEY: &str = "SCB_GAMESCOPE_ARGS=";
pub(crate) const LAUNCH_OPTIONS_KEY: &str = "command+=";
pub(crate) const EXPORT_KEY: &str = "export ";

/// Line 1 prefix carrying a file's display name.
pub(crate) const DISPLAY_NAME_PREFIX: &str = "# ";

pub(crate) const GLOBAL_DISPLAY_NAME: &str = "Global Config";

pub(crate) const CONFIG_DIR_NAME: &str = "scopebuddy";
pub(crate) const GLOBAL_FILE_NAME: &str = "scb.conf";
pub(crate) const APPID_DIR_NAME: &str = "AppID";
pub(crate) const CONF_EXTENSION: &str = "conf";

/// Launcher folder that can never be removed.
pub(crate) const PROTECTED_LAUNCHER: &str = "steam";

/// Known boolean flag lines.
pub(crate) mod flags {
    pub(crate) const NOSCOPE: &str = "SCB_NOSCOPE=1";
    pub(crate) const AUTO_RES: &str = "SCB_AUTO_RES=1";
    pub(crate) const AUTO_HDR: &str = "SCB_AUTO_HDR=1";
    pub(crate) const AUTO_VRR: &str = "SCB_AUTO_VRR=1";
    pub(crate) const DEBUG: &str = "SCB_DEBUG=1";

    /// Export lines that pair badly with an active gamescope session.
    pub(crate) const MANGOHUD_EXPORTS: [&str; 2] = ["export mangohud", "export MANGOHUD=1"];
}

/// Default file contents shipped with ScopeBuddy.
pub(crate) const DEFAULT_TEMPLATE: &str = r#"# This is the config file that let's you assign defaults for gamescope when using the scopebuddy script
# lines starting with # are ignored
# Conf files matching the games Steam AppID stored in ~/.conf/scopebuddy/AppID/ will be sourced after
# ~/.config/scopebuddy/scb.conf or whichever file you specify with SCB_CONF=someotherfile.conf env var in the launch options.
# 
# Example for always exporting specific environment variables for gamescope
#export XKB_DEFAULT_LAYOUT=no
#export MANGOHUD_CONFIG=preset=2
#
# Example for providing default gamescope arguments through scopebuddy if no arguments are given to the scopebuddy script, this does not need to be exported.
# To not use this default set of arguments, just launch scb with SCB_NOSCOPE=1 or just add any gamescope argument before the '-- %command%' then this variable will be ignored
#SCB_GAMESCOPE_ARGS="--mangoapp -f -w 2560 -h 1440 -W 2560 -H 1440 -r 180 --force-grab-cursor --hdr-enabled -e"
#
# To auto-detect KDE display width, height, refresh, VRR and HDR states, you can use SCB_AUTO_* {RES|HDR|VRR}
# These vars will override any previously set values for -W and -H or append --hdr-enabled and --adaptive-sync
# automatically depending on the current settings for your active display, or the display chosen with -O /
# --prefer-output flags in gamescsope.
#SCB_AUTO_RES=1
#SCB_AUTO_HDR=1
#SCB_AUTO_VRR=1
# To debug scopebuddy output, uncomment the following line. After launching games, the executed cmd will be output to ~/.config/scopebuddy/scopebuddy.log
#SCB_DEBUG=1
###
## FOR ADVANCED USE INSIDE AN APPID CONFIG
###
# The config files are treated as a bash script by scopebuddy, this means you can use bash to do simple tasks before the game runs
# or you can check which mode scopebuddy is running in and apply settings accordingly, below are some handy variables for scripting.
# $SCB_NOSCOPE will be set to 1 if we are running in no gamescope mode
# $SCB_GAMEMODE will be set to 1 if we are running inside steam gamemode (which means SCB_NOSCOPE will also be set to 1 due to nested gamescope not working in gamemode)
# $command will contain everything steam expanded %command% into
"#;
