use crate::conf_file::{self, ConfigFile};
use crate::error::{ScbError, ScbResult};
use crate::markers::{
    APPID_DIR_NAME, CONF_EXTENSION, DEFAULT_TEMPLATE, GLOBAL_FILE_NAME, PROTECTED_LAUNCHER,
};
use crate::rewrite::{self, GAMESCOPE_ARGS};
use crate::types::{ConfigNode, LauncherEntry};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Target accepted by `open` for the global config.
pub(crate) const GLOBAL_TARGET: &str = "global";

/// The ScopeBuddy config root: `scb.conf` plus `AppID/<launcher>/*.conf`.
///
/// Listings are snapshots taken on demand; nothing watches the tree.
#[derive(Debug, Clone)]
pub(crate) struct ConfigDirectory {
    root: PathBuf,
    template_path: Option<PathBuf>,
    strict_file_names: bool,
}

fn is_conf(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(CONF_EXTENSION))
}

fn with_conf_extension(name: &str) -> String {
    if is_conf(Path::new(name)) {
        name.to_string()
    } else {
        format!("{name}.{CONF_EXTENSION}")
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ConfigDirectory {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        ConfigDirectory {
            root: root.into(),
            template_path: None,
            strict_file_names: true,
        }
    }

    /// Template copied into new files instead of the built-in default.
    pub(crate) fn with_template(mut self, template_path: Option<PathBuf>) -> Self {
        self.template_path = template_path;
        self
    }

    pub(crate) fn with_strict_file_names(mut self, strict: bool) -> Self {
        self.strict_file_names = strict;
        self
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn global_config_path(&self) -> PathBuf {
        self.root.join(GLOBAL_FILE_NAME)
    }

    pub(crate) fn appid_dir(&self) -> PathBuf {
        self.root.join(APPID_DIR_NAME)
    }

    fn is_global_path(&self, path: &Path) -> bool {
        let global = self.global_config_path();
        if path == global {
            return true;
        }
        match (fs::canonicalize(path), fs::canonicalize(&global)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn open_path(&self, path: &Path) -> ConfigFile {
        ConfigFile::open(path, self.is_global_path(path))
    }

    /// Resolves `global`, `<launcher>/<file>[.conf]` under `AppID`, or a path.
    pub(crate) fn open(&self, target: &str) -> ScbResult<ConfigFile> {
        if target == GLOBAL_TARGET {
            let path = self.global_config_path();
            if !path.is_file() {
                return Err(ScbError::NotFound(path));
            }
            return Ok(ConfigFile::open(path, true));
        }

        let under_appid = self.appid_dir().join(with_conf_extension(target));
        let candidates = [under_appid, PathBuf::from(target)];
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Ok(self.open_path(path)),
            None => Err(ScbError::NotFound(candidates[0].clone())),
        }
    }

    fn template_text(&self) -> ScbResult<String> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path).map_err(|e| ScbError::io(path, e)),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }

    /// Creates the global file from the template when absent and makes sure it
    /// carries a usable gamescope directive.
    pub(crate) fn ensure_global_config(&self) -> ScbResult<ConfigFile> {
        let path = self.global_config_path();
        fs::create_dir_all(self.appid_dir()).map_err(|e| ScbError::io(&self.appid_dir(), e))?;
        if !path.exists() {
            fs::write(&path, self.template_text()?).map_err(|e| ScbError::io(&path, e))?;
            info!(path = %path.display(), "created global config");
        }
        let global = ConfigFile::open(path, true);
        global.ensure_gamescope_line()?;
        Ok(global)
    }

    /// Recursive, name-sorted listing of directories and `.conf` files.
    pub(crate) fn scan(&self) -> ScbResult<ConfigNode> {
        self.scan_dir(&self.root)
    }

    fn scan_dir(&self, dir: &Path) -> ScbResult<ConfigNode> {
        let entries = fs::read_dir(dir).map_err(|e| ScbError::io(dir, e))?;
        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            let is_dir = match entry.file_type() {
                Ok(file_type) => file_type.is_dir(),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping entry of unknown type");
                    continue;
                }
            };

            if is_dir {
                match self.scan_dir(&path) {
                    Ok(node) => children.push(node),
                    Err(err) => warn!(path = %path.display(), error = %err, "skipping directory"),
                }
            } else if is_conf(&path) {
                match self.open_path(&path).display_name() {
                    Ok(display_name) => children.push(ConfigNode::File {
                        name: entry_name(&path),
                        path,
                        display_name,
                    }),
                    Err(err) => warn!(path = %path.display(), error = %err, "skipping file"),
                }
            }
        }
        children.sort_by(|a, b| a.name().cmp(b.name()));

        Ok(ConfigNode::Directory {
            name: entry_name(dir),
            path: dir.to_path_buf(),
            children,
        })
    }

    /// Launcher folder name to its `.conf` files, one level under `AppID`.
    pub(crate) fn launcher_groups(&self) -> ScbResult<BTreeMap<String, Vec<LauncherEntry>>> {
        let mut groups = BTreeMap::new();
        let appid = self.appid_dir();
        if !appid.is_dir() {
            return Ok(groups);
        }

        let ConfigNode::Directory { children, .. } = self.scan_dir(&appid)? else {
            return Ok(groups);
        };
        for child in children {
            let ConfigNode::Directory { name, children, .. } = child else {
                continue;
            };
            let entries = children
                .into_iter()
                .filter_map(|node| match node {
                    ConfigNode::File {
                        name,
                        path,
                        display_name,
                    } => Some(LauncherEntry {
                        file_name: name,
                        display_name,
                        path,
                    }),
                    ConfigNode::Directory { .. } => None,
                })
                .collect();
            groups.insert(name, entries);
        }
        Ok(groups)
    }

    fn validate_component(&self, name: &str) -> ScbResult<()> {
        let reject = |reason: &'static str| {
            Err(ScbError::InvalidFileName {
                name: name.to_string(),
                reason,
            })
        };
        if name.trim().is_empty() {
            return reject("must not be empty");
        }
        if name == "." || name == ".." {
            return reject("must not be a relative path component");
        }
        if name.contains(['/', '\\']) || Path::new(name).is_absolute() {
            return reject("must not contain path separators");
        }
        if name.contains('\0') {
            return reject("must not contain NUL");
        }
        if self.strict_file_names
            && !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ' ' | '-'))
        {
            return reject("only letters, digits, '.', '_', '-' and spaces are allowed");
        }
        Ok(())
    }

    /// Validates a new file name and appends `.conf` when missing.
    pub(crate) fn validate_file_name(&self, file_name: &str) -> ScbResult<String> {
        self.validate_component(file_name)?;
        Ok(with_conf_extension(file_name))
    }

    fn launcher_dir(&self, target_dir: &Path) -> ScbResult<PathBuf> {
        if target_dir.is_absolute() {
            return Ok(target_dir.to_path_buf());
        }
        self.validate_component(&target_dir.to_string_lossy())?;
        Ok(self.appid_dir().join(target_dir))
    }

    /// Creates `<target_dir>/<file_name>.conf` from the template, named
    /// `display_name`, with an empty disabled gamescope directive.
    ///
    /// A relative `target_dir` is a launcher folder under `AppID`.
    pub(crate) fn create_file(
        &self,
        file_name: &str,
        display_name: &str,
        target_dir: &Path,
    ) -> ScbResult<PathBuf> {
        let file_name = self.validate_file_name(file_name)?;
        let stem = file_name.trim_end_matches(&format!(".{CONF_EXTENSION}"));
        let display_name = match display_name.trim() {
            "" => conf_file::checked_display_name(stem)?,
            _ => conf_file::checked_display_name(display_name)?,
        };
        let dir = self.launcher_dir(target_dir)?;
        let path = dir.join(&file_name);
        if path.exists() {
            return Err(ScbError::AlreadyExists(path));
        }

        let mut lines = rewrite::split_lines(&self.template_text()?);
        conf_file::write_display_name(&mut lines, display_name);
        rewrite::park(&mut lines, &GAMESCOPE_ARGS, "");

        fs::create_dir_all(&dir).map_err(|e| ScbError::io(&dir, e))?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => ScbError::AlreadyExists(path.clone()),
                _ => ScbError::io(&path, e),
            })?;
        if let Err(err) = file.write_all(rewrite::join_lines(&lines).as_bytes()) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path) {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "failed to remove partial config file"
                );
            }
            return Err(ScbError::io(&path, err));
        }
        info!(path = %path.display(), "created config file");
        Ok(path)
    }

    pub(crate) fn create_launcher(&self, name: &str) -> ScbResult<PathBuf> {
        self.validate_component(name)?;
        let dir = self.appid_dir().join(name);
        if dir.exists() {
            return Err(ScbError::AlreadyExists(dir));
        }
        fs::create_dir_all(&dir).map_err(|e| ScbError::io(&dir, e))?;
        info!(path = %dir.display(), "created launcher folder");
        Ok(dir)
    }

    pub(crate) fn remove_file(&self, file: &ConfigFile) -> ScbResult<()> {
        if file.is_global() || self.is_global_path(file.path()) {
            return Err(ScbError::GlobalConfigProtected);
        }
        fs::remove_file(file.path()).map_err(|e| ScbError::io(file.path(), e))?;
        info!(path = %file.path().display(), "removed config file");
        Ok(())
    }

    /// Deletes a launcher folder and every file in it. `steam` is refused.
    pub(crate) fn remove_launcher(&self, name: &str) -> ScbResult<()> {
        if name == PROTECTED_LAUNCHER {
            return Err(ScbError::ProtectedLauncher(name.to_string()));
        }
        self.validate_component(name)?;
        let dir = self.appid_dir().join(name);
        if !dir.is_dir() {
            return Err(ScbError::NotFound(dir));
        }
        fs::remove_dir_all(&dir).map_err(|e| ScbError::io(&dir, e))?;
        debug!(path = %dir.display(), "removed launcher folder");
        Ok(())
    }
}
