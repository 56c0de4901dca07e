use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub(crate) struct GamescopeLine {
    pub(crate) args: String,
    pub(crate) active: bool,
}

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FlagStates {
    pub(crate) noscope: bool,
    pub(crate) auto_res: bool,
    pub(crate) auto_hdr: bool,
    pub(crate) auto_vrr: bool,
    pub(crate) debug: bool,
}

/// Every field of one `.conf` file, taken from a single read.
#[derive(Debug, Serialize, Clone)]
pub(crate) struct FileSnapshot {
    pub(crate) path: PathBuf,
    pub(crate) display_name: String,
    pub(crate) is_global: bool,
    pub(crate) exports: Vec<String>,
    pub(crate) gamescope: GamescopeLine,
    /// Args that re-enabling gamescope would bring back.
    pub(crate) stored_gamescope_args: Option<String>,
    pub(crate) launch_options: String,
    pub(crate) flags: FlagStates,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum ConfigNode {
    Directory {
        name: String,
        path: PathBuf,
        children: Vec<ConfigNode>,
    },
    File {
        name: String,
        path: PathBuf,
        display_name: String,
    },
}

impl ConfigNode {
    pub(crate) fn name(&self) -> &str {
        match self {
            ConfigNode::Directory { name, .. } | ConfigNode::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub(crate) struct LauncherEntry {
    pub(crate) file_name: String,
    pub(crate) display_name: String,
    pub(crate) path: PathBuf,
}
