use crate::error::{ScbError, ScbResult};
use crate::markers::{DISPLAY_NAME_PREFIX, GLOBAL_DISPLAY_NAME, flags};
use crate::rewrite::{self, EXPORT, GAMESCOPE_ARGS, LAUNCH_OPTIONS, LineState};
use crate::types::{FileSnapshot, FlagStates, GamescopeLine};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Boolean switches ScopeBuddy reads as bare `KEY=1` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    Noscope,
    /// `SCB_AUTO_RES`, `SCB_AUTO_HDR` and `SCB_AUTO_VRR` together.
    Auto,
    Debug,
}

impl Flag {
    fn lines(self) -> &'static [&'static str] {
        match self {
            Flag::Noscope => &[flags::NOSCOPE],
            Flag::Auto => &[flags::AUTO_RES, flags::AUTO_HDR, flags::AUTO_VRR],
            Flag::Debug => &[flags::DEBUG],
        }
    }
}

/// Handle on one ScopeBuddy `.conf` file.
///
/// Nothing is cached: every accessor re-reads the file and every mutator is a
/// single read-modify-write that only touches the disk when the content
/// changed. Writers are not coordinated, the last write wins.
#[derive(Debug, Clone)]
pub(crate) struct ConfigFile {
    path: PathBuf,
    is_global: bool,
}

fn single_line(value: &str, field: &'static str) -> ScbResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(ScbError::InvalidValue {
            field,
            reason: "must be a single line",
        });
    }
    Ok(())
}

fn has_malformed_gamescope_line(lines: &[String]) -> bool {
    rewrite::family(lines, &GAMESCOPE_ARGS)
        .iter()
        .any(|member| member.state == LineState::Active && member.value.is_none())
}

fn flag_states(lines: &[String]) -> FlagStates {
    FlagStates {
        noscope: rewrite::has_exact_line(lines, flags::NOSCOPE),
        auto_res: rewrite::has_exact_line(lines, flags::AUTO_RES),
        auto_hdr: rewrite::has_exact_line(lines, flags::AUTO_HDR),
        auto_vrr: rewrite::has_exact_line(lines, flags::AUTO_VRR),
        debug: rewrite::has_exact_line(lines, flags::DEBUG),
    }
}

fn gamescope_from(lines: &[String]) -> GamescopeLine {
    let active = rewrite::family(lines, &GAMESCOPE_ARGS)
        .iter()
        .any(|member| member.state == LineState::Active);
    let args = rewrite::find(lines, &GAMESCOPE_ARGS)
        .map(|(_, value)| value)
        .unwrap_or_default();
    GamescopeLine { args, active }
}

impl ConfigFile {
    pub(crate) fn open(path: impl Into<PathBuf>, is_global: bool) -> Self {
        ConfigFile {
            path: path.into(),
            is_global,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_global(&self) -> bool {
        self.is_global
    }

    pub(crate) fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn read_lines(&self) -> ScbResult<Vec<String>> {
        let content = fs::read_to_string(&self.path).map_err(|e| ScbError::io(&self.path, e))?;
        Ok(rewrite::split_lines(&content))
    }

    fn write_lines(&self, lines: &[String]) -> ScbResult<()> {
        fs::write(&self.path, rewrite::join_lines(lines)).map_err(|e| ScbError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "wrote config file");
        Ok(())
    }

    /// Runs `edit` on the current lines and writes the result back once.
    ///
    /// Returns whether the file changed. Nothing is written when `edit` fails.
    pub(crate) fn update<F>(&self, edit: F) -> ScbResult<bool>
    where
        F: FnOnce(&mut Vec<String>) -> ScbResult<()>,
    {
        let original = self.read_lines()?;
        let mut lines = original.clone();
        edit(&mut lines)?;
        if lines == original {
            debug!(path = %self.path.display(), "config file already up to date");
            return Ok(false);
        }
        self.write_lines(&lines)?;
        Ok(true)
    }

    /// Fresh read behind every field accessor; repairs a malformed gamescope line first.
    fn healed_lines(&self) -> ScbResult<Vec<String>> {
        let mut lines = self.read_lines()?;
        if has_malformed_gamescope_line(&lines) {
            warn!(
                path = %self.path.display(),
                "disabling malformed SCB_GAMESCOPE_ARGS line"
            );
            rewrite::ensure_gamescope_line(&mut lines);
            self.write_lines(&lines)?;
        }
        Ok(lines)
    }

    fn display_name_from(&self, lines: &[String]) -> String {
        if self.is_global {
            return GLOBAL_DISPLAY_NAME.to_string();
        }
        lines
            .first()
            .and_then(|line| rewrite::body(line).strip_prefix(DISPLAY_NAME_PREFIX))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.file_name())
    }

    pub(crate) fn display_name(&self) -> ScbResult<String> {
        Ok(self.display_name_from(&self.healed_lines()?))
    }

    /// Active `export` lines with the prefix stripped and edges trimmed, in file order.
    pub(crate) fn export_lines(&self) -> ScbResult<Vec<String>> {
        Ok(export_values(&self.healed_lines()?))
    }

    pub(crate) fn gamescope_args(&self) -> ScbResult<GamescopeLine> {
        Ok(gamescope_from(&self.healed_lines()?))
    }

    /// Args of the active directive, else the ones re-enabling would restore.
    pub(crate) fn stored_gamescope_args(&self) -> ScbResult<Option<String>> {
        let lines = self.healed_lines()?;
        Ok(rewrite::find(&lines, &GAMESCOPE_ARGS)
            .map(|(_, value)| value)
            .or_else(|| rewrite::parked_value(&lines, &GAMESCOPE_ARGS)))
    }

    pub(crate) fn launch_options(&self) -> ScbResult<String> {
        Ok(launch_value(&self.healed_lines()?))
    }

    pub(crate) fn has_exact_line(&self, prefix: &str) -> ScbResult<bool> {
        Ok(rewrite::has_exact_line(&self.healed_lines()?, prefix))
    }

    pub(crate) fn has_mangohud_export(&self) -> ScbResult<bool> {
        for prefix in flags::MANGOHUD_EXPORTS {
            if self.has_exact_line(prefix)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn snapshot(&self) -> ScbResult<FileSnapshot> {
        let lines = self.healed_lines()?;
        let gamescope = gamescope_from(&lines);
        let stored_gamescope_args = if gamescope.active {
            Some(gamescope.args.clone())
        } else {
            rewrite::parked_value(&lines, &GAMESCOPE_ARGS)
        };
        Ok(FileSnapshot {
            path: self.path.clone(),
            display_name: self.display_name_from(&lines),
            is_global: self.is_global,
            exports: export_values(&lines),
            gamescope,
            stored_gamescope_args,
            launch_options: launch_value(&lines),
            flags: flag_states(&lines),
        })
    }

    /// Rewrites line 1 as `# <name>`, or inserts it when line 1 carries none.
    pub(crate) fn set_display_name(&self, name: &str) -> ScbResult<bool> {
        if self.is_global {
            return Err(ScbError::GlobalConfigProtected);
        }
        let name = checked_display_name(name)?;
        self.update(|lines| {
            write_display_name(lines, name);
            Ok(())
        })
    }

    /// Makes the active export lines match `values` as a set.
    pub(crate) fn set_export_lines<S: AsRef<str>>(&self, values: &[S]) -> ScbResult<bool> {
        let mut wanted: Vec<String> = Vec::new();
        for value in values {
            let value = value.as_ref();
            single_line(value, "export line")?;
            let value = value.trim();
            if !value.is_empty() && !wanted.iter().any(|w| w == value) {
                wanted.push(value.to_string());
            }
        }

        self.update(|lines| {
            rewrite::reconcile(lines, &EXPORT, &wanted);
            Ok(())
        })
    }

    /// Stores `args`, active or disabled. Disabled args are what re-enabling restores.
    pub(crate) fn set_gamescope_line(&self, args: &str, active: bool) -> ScbResult<bool> {
        single_line(args, "gamescope args")?;
        if args.contains('"') {
            return Err(ScbError::InvalidValue {
                field: "gamescope args",
                reason: "must not contain a double quote",
            });
        }
        let args = args.trim();

        self.update(|lines| {
            if active {
                rewrite::replace_or_append(lines, &GAMESCOPE_ARGS, args);
            } else {
                rewrite::park(lines, &GAMESCOPE_ARGS, args);
            }
            rewrite::collapse_adjacent_duplicates(lines, &GAMESCOPE_ARGS);
            Ok(())
        })
    }

    /// Re-activates the stored gamescope args, or disables the active ones.
    pub(crate) fn set_gamescope_active(&self, active: bool) -> ScbResult<bool> {
        self.update(|lines| {
            rewrite::ensure_gamescope_line(lines);
            rewrite::set_active(lines, &GAMESCOPE_ARGS, active);
            Ok(())
        })
    }

    pub(crate) fn set_launch_options(&self, options: &str) -> ScbResult<bool> {
        single_line(options, "launch options")?;
        if options.contains('\'') {
            return Err(ScbError::InvalidValue {
                field: "launch options",
                reason: "must not contain a single quote",
            });
        }
        let options = options.trim();
        let value = if options.is_empty() {
            String::new()
        } else {
            format!(" {options}")
        };

        self.update(|lines| {
            rewrite::replace_or_append(lines, &LAUNCH_OPTIONS, &value);
            rewrite::collapse_adjacent_duplicates(lines, &LAUNCH_OPTIONS);
            Ok(())
        })
    }

    pub(crate) fn edit_exact_lines<P, R>(&self, prefixes: &[P], replacements: &[R]) -> ScbResult<bool>
    where
        P: AsRef<str>,
        R: AsRef<str>,
    {
        self.update(|lines| rewrite::edit_exact_lines(lines, prefixes, replacements).map(|_| ()))
    }

    /// Uncomments (`on`) or comments out every line of `flag`, appending it when missing.
    pub(crate) fn set_flag(&self, flag: Flag, on: bool) -> ScbResult<bool> {
        self.update(|lines| {
            let (prefixes, replacements): (Vec<String>, Vec<String>) = flag
                .lines()
                .iter()
                .filter(|line| rewrite::has_exact_line(lines, line) != on)
                .map(|line| {
                    let commented = format!("#{line}");
                    if on {
                        (commented, line.to_string())
                    } else {
                        (line.to_string(), commented)
                    }
                })
                .unzip();
            rewrite::edit_exact_lines(lines, &prefixes, &replacements).map(|_| ())
        })
    }

    /// Brings a file up to a usable gamescope directive; used on bootstrap.
    pub(crate) fn ensure_gamescope_line(&self) -> ScbResult<bool> {
        self.update(|lines| {
            rewrite::ensure_gamescope_line(lines);
            Ok(())
        })
    }
}

/// Trimmed display name, rejected when empty or spanning lines.
pub(crate) fn checked_display_name(name: &str) -> ScbResult<&str> {
    single_line(name, "display name")?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ScbError::InvalidValue {
            field: "display name",
            reason: "must not be empty",
        });
    }
    Ok(name)
}

pub(crate) fn write_display_name(lines: &mut Vec<String>, name: &str) {
    let rendered = format!("{DISPLAY_NAME_PREFIX}{name}\n");
    match lines.first_mut() {
        Some(first) if first.starts_with(DISPLAY_NAME_PREFIX) => {
            let had_newline = first.ends_with('\n');
            *first = rendered;
            if !had_newline {
                first.pop();
            }
        }
        _ => lines.insert(0, rendered),
    }
}

// Values compare trimmed on write, so they read back trimmed too.
fn export_values(lines: &[String]) -> Vec<String> {
    rewrite::family(lines, &EXPORT)
        .into_iter()
        .filter(|member| member.state == LineState::Active)
        .filter_map(|member| member.value)
        .map(|value| value.trim().to_string())
        .collect()
}

fn launch_value(lines: &[String]) -> String {
    rewrite::find(lines, &LAUNCH_OPTIONS)
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn conf(content: &str) -> (TempDir, ConfigFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.conf");
        fs::write(&path, content).unwrap();
        (dir, ConfigFile::open(path, false))
    }

    fn contents(file: &ConfigFile) -> String {
        fs::read_to_string(file.path()).unwrap()
    }

    #[test]
    fn display_name_reads_first_line() {
        let (_dir, file) = conf("# Elden Ring\nexport A=1\n");
        assert_eq!(file.display_name().unwrap(), "Elden Ring");
    }

    #[test]
    fn display_name_falls_back_to_file_name() {
        let (_dir, file) = conf("export A=1\n");
        assert_eq!(file.display_name().unwrap(), "game.conf");
        let (_dir, empty) = conf("");
        assert_eq!(empty.display_name().unwrap(), "game.conf");
    }

    #[test]
    fn global_file_has_fixed_name_and_refuses_rename() {
        let (_dir, file) = conf("# whatever\n");
        let global = ConfigFile::open(file.path(), true);
        assert_eq!(global.display_name().unwrap(), "Global Config");
        assert!(matches!(
            global.set_display_name("Mine"),
            Err(ScbError::GlobalConfigProtected)
        ));
        assert_eq!(contents(&global), "# whatever\n");
    }

    #[test]
    fn set_display_name_replaces_or_inserts_line_one() {
        let (_dir, file) = conf("# Old\nexport A=1\n");
        assert!(file.set_display_name("New").unwrap());
        assert_eq!(contents(&file), "# New\nexport A=1\n");
        assert!(!file.set_display_name("New").unwrap());

        let (_dir, bare) = conf("export A=1\n");
        bare.set_display_name("Named").unwrap();
        assert_eq!(contents(&bare), "# Named\nexport A=1\n");
    }

    #[test]
    fn set_display_name_rejects_newline_without_writing() {
        let (_dir, file) = conf("# Old\n");
        let err = file.set_display_name("a\nb").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(contents(&file), "# Old\n");
    }

    #[test]
    fn export_round_trip_is_set_equal() {
        let (_dir, file) = conf("# Game\n#export XKB_DEFAULT_LAYOUT=no\nexport OLD=1\n# keep me\n");
        let wanted = ["MANGOHUD=1", "DXVK_HUD=fps", "MANGOHUD=1", "  "];
        assert!(file.set_export_lines(&wanted).unwrap());

        let mut got = file.export_lines().unwrap();
        got.sort();
        assert_eq!(got, vec!["DXVK_HUD=fps", "MANGOHUD=1"]);
        assert!(contents(&file).contains("#SCBGUI#export OLD=1\n"));
        assert!(contents(&file).contains("# keep me\n"));

        let once = contents(&file);
        assert!(!file.set_export_lines(&wanted).unwrap());
        assert_eq!(contents(&file), once);
    }

    #[test]
    fn export_lines_restore_previously_removed_value() {
        let (_dir, file) = conf("export A=1\n");
        file.set_export_lines::<&str>(&[]).unwrap();
        assert_eq!(contents(&file), "#SCBGUI#export A=1\n");
        file.set_export_lines(&["A=1"]).unwrap();
        assert_eq!(contents(&file), "export A=1\n");
    }

    #[test]
    fn gamescope_replacement_marks_old_line_once() {
        let (_dir, file) = conf("# A\n# user note\nSCB_GAMESCOPE_ARGS=\"-f\"\n");
        file.set_gamescope_line("-w 1920 -h 1080", true).unwrap();
        file.set_gamescope_line("-w 1920 -h 1080", true).unwrap();
        let text = contents(&file);
        assert!(text.contains("# user note\n"));
        assert_eq!(text.matches("#SCBGUI#").count(), 1);
        assert_eq!(
            file.gamescope_args().unwrap(),
            GamescopeLine {
                args: "-w 1920 -h 1080".to_string(),
                active: true
            }
        );
    }

    #[test]
    fn gamescope_disable_and_restore_keep_args() {
        let (_dir, file) = conf("SCB_GAMESCOPE_ARGS=\"-f\"\n");
        file.set_gamescope_line("-b", true).unwrap();
        file.set_gamescope_line("-f -r 60", false).unwrap();
        assert_eq!(
            file.gamescope_args().unwrap(),
            GamescopeLine {
                args: String::new(),
                active: false
            }
        );
        assert_eq!(
            file.stored_gamescope_args().unwrap().as_deref(),
            Some("-f -r 60")
        );

        let disabled = contents(&file);
        assert!(!file.set_gamescope_line("-f -r 60", false).unwrap());
        assert_eq!(contents(&file), disabled);

        file.set_gamescope_active(true).unwrap();
        assert_eq!(file.gamescope_args().unwrap().args, "-f -r 60");
    }

    #[test]
    fn gamescope_rejects_double_quote() {
        let (_dir, file) = conf("SCB_GAMESCOPE_ARGS=\"\"\n");
        let err = file.set_gamescope_line("-f \"x\"", true).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(contents(&file), "SCB_GAMESCOPE_ARGS=\"\"\n");
    }

    #[test]
    fn reading_malformed_gamescope_line_heals_file() {
        let (_dir, file) = conf("# A\nSCB_GAMESCOPE_ARGS=1920\n");
        assert_eq!(
            file.gamescope_args().unwrap(),
            GamescopeLine {
                args: String::new(),
                active: true
            }
        );
        assert_eq!(
            contents(&file),
            "# A\n#SCBGUI_ERROR_PREVENTATION!#SCB_GAMESCOPE_ARGS=1920\nSCB_GAMESCOPE_ARGS=\"\"\n"
        );
    }

    #[test]
    fn every_field_read_heals_malformed_gamescope_line() {
        let healed =
            "# A\n#SCBGUI_ERROR_PREVENTATION!#SCB_GAMESCOPE_ARGS=1920\nSCB_GAMESCOPE_ARGS=\"\"\n";

        let (_dir, file) = conf("# A\nSCB_GAMESCOPE_ARGS=1920\n");
        assert!(file.export_lines().unwrap().is_empty());
        assert_eq!(contents(&file), healed);

        let (_dir, file) = conf("# A\nSCB_GAMESCOPE_ARGS=1920\n");
        assert_eq!(file.display_name().unwrap(), "A");
        assert_eq!(contents(&file), healed);

        let (_dir, file) = conf("# A\nSCB_GAMESCOPE_ARGS=1920\n");
        assert_eq!(file.launch_options().unwrap(), "");
        assert_eq!(contents(&file), healed);

        let (_dir, file) = conf("# A\nSCB_GAMESCOPE_ARGS=1920\n");
        assert!(!file.has_exact_line("SCB_NOSCOPE=1").unwrap());
        assert_eq!(contents(&file), healed);
    }

    #[test]
    fn export_values_read_back_trimmed() {
        let (_dir, file) = conf("export A=1 \nexport  B=2\n");
        assert_eq!(file.export_lines().unwrap(), vec!["A=1", "B=2"]);
        assert!(!file.set_export_lines(&["A=1", "B=2"]).unwrap());
    }

    #[test]
    fn export_lines_land_at_end_without_related_lines() {
        let (_dir, file) = conf("# export helpers\nfoo");
        file.set_export_lines(&["A=1"]).unwrap();
        assert_eq!(contents(&file), "# export helpers\nfoo\nexport A=1\n");
    }

    #[test]
    fn launch_options_written_single_quoted() {
        let (_dir, file) = conf("# A\n");
        file.set_launch_options("-novid -console").unwrap();
        assert_eq!(contents(&file), "# A\ncommand+=' -novid -console'\n");
        assert_eq!(file.launch_options().unwrap(), "-novid -console");
        assert!(!file.set_launch_options(" -novid -console ").unwrap());

        file.set_launch_options("").unwrap();
        assert_eq!(file.launch_options().unwrap(), "");
        assert!(contents(&file).contains("#SCBGUI#command+=' -novid -console'\n"));
    }

    #[test]
    fn launch_options_reject_single_quote() {
        let (_dir, file) = conf("# A\n");
        assert!(file.set_launch_options("it's").unwrap_err().is_validation());
        assert_eq!(contents(&file), "# A\n");
    }

    #[test]
    fn noscope_toggle_appends_and_comments() {
        let (_dir, file) = conf("# A\nexport A=1\n");
        assert!(file.set_flag(Flag::Noscope, true).unwrap());
        assert_eq!(contents(&file), "# A\nexport A=1\nSCB_NOSCOPE=1\n");
        assert!(file.has_exact_line("SCB_NOSCOPE=1").unwrap());
        assert!(!file.set_flag(Flag::Noscope, true).unwrap());

        file.set_flag(Flag::Noscope, false).unwrap();
        assert_eq!(contents(&file), "# A\nexport A=1\n#SCB_NOSCOPE=1\n");
        assert!(!file.snapshot().unwrap().flags.noscope);
    }

    #[test]
    fn auto_flag_uncomments_template_lines() {
        let (_dir, file) = conf("#SCB_AUTO_RES=1\n#SCB_AUTO_HDR=1\n#SCB_AUTO_VRR=1\n");
        file.set_flag(Flag::Auto, true).unwrap();
        assert_eq!(
            contents(&file),
            "SCB_AUTO_RES=1\nSCB_AUTO_HDR=1\nSCB_AUTO_VRR=1\n"
        );
        let states = file.snapshot().unwrap().flags;
        assert!(states.auto_res && states.auto_hdr && states.auto_vrr);
    }

    #[test]
    fn mismatched_exact_edit_leaves_file_alone() {
        let (_dir, file) = conf("SCB_DEBUG=1\n");
        let err = file
            .edit_exact_lines(&["SCB_DEBUG=1"], &["#SCB_DEBUG=1", "x"])
            .unwrap_err();
        assert!(matches!(err, ScbError::MismatchedEdit { .. }));
        assert_eq!(contents(&file), "SCB_DEBUG=1\n");
    }

    #[test]
    fn snapshot_reports_every_field() {
        let (_dir, file) = conf(
            "# Portal 2\nexport MANGOHUD=1\nSCB_GAMESCOPE_ARGS=\"-f\"\ncommand+=' -novid'\nSCB_DEBUG=1\n",
        );
        let snap = file.snapshot().unwrap();
        assert_eq!(snap.display_name, "Portal 2");
        assert_eq!(snap.exports, vec!["MANGOHUD=1"]);
        assert_eq!(snap.gamescope.args, "-f");
        assert_eq!(snap.stored_gamescope_args.as_deref(), Some("-f"));
        assert_eq!(snap.launch_options, "-novid");
        assert!(snap.flags.debug);
        assert!(!snap.flags.noscope);
        assert!(file.has_mangohud_export().unwrap());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::open(dir.path().join("gone.conf"), false);
        assert!(file.display_name().unwrap_err().is_not_found());
    }
}
