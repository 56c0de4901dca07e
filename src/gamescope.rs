use crate::error::{ScbError, ScbResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgKind {
    Flag,
    Number,
    Choice(&'static [&'static str]),
    Ratio,
}

impl ArgKind {
    fn accepts(self, value: &str) -> bool {
        match self {
            ArgKind::Flag => false,
            ArgKind::Number => value.parse::<u32>().is_ok(),
            ArgKind::Choice(choices) => choices.contains(&value),
            ArgKind::Ratio => value
                .parse::<f64>()
                .is_ok_and(|ratio| ratio.is_finite() && ratio > 0.0),
        }
    }

    fn expectation(self) -> &'static str {
        match self {
            ArgKind::Flag => "takes no value",
            ArgKind::Number => "expected a whole number",
            ArgKind::Choice(_) => "expected one of the listed choices",
            ArgKind::Ratio => "expected a positive decimal",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ArgSpec {
    pub(crate) field: &'static str,
    pub(crate) flag: &'static str,
    pub(crate) aliases: &'static [&'static str],
    pub(crate) kind: ArgKind,
}

const SCALERS: &[&str] = &["auto", "integer", "fit", "fill", "stretch"];
const FILTERS: &[&str] = &["linear", "nearest", "fsr", "nis", "pixel"];

/// Gamescope options with a dedicated control, in render order.
#[rustfmt::skip]
pub(crate) const KNOWN_ARGS: &[ArgSpec] = &[
    ArgSpec { field: "mangoapp", flag: "--mangoapp", aliases: &[], kind: ArgKind::Flag },
    ArgSpec { field: "render_height", flag: "-h", aliases: &["--nested-height"], kind: ArgKind::Number },
    ArgSpec { field: "render_width", flag: "-w", aliases: &["--nested-width"], kind: ArgKind::Number },
    ArgSpec { field: "fps", flag: "-r", aliases: &["--nested-refresh"], kind: ArgKind::Number },
    ArgSpec { field: "fullscreen", flag: "-f", aliases: &["--fullscreen"], kind: ArgKind::Flag },
    ArgSpec { field: "borderless", flag: "-b", aliases: &["--borderless"], kind: ArgKind::Flag },
    ArgSpec { field: "output_height", flag: "-H", aliases: &["--output-height"], kind: ArgKind::Number },
    ArgSpec { field: "output_width", flag: "-W", aliases: &["--output-width"], kind: ArgKind::Number },
    ArgSpec { field: "steam", flag: "-e", aliases: &["--steam"], kind: ArgKind::Flag },
    ArgSpec { field: "hdr", flag: "--hdr-enabled", aliases: &[], kind: ArgKind::Flag },
    ArgSpec { field: "max_scale", flag: "-m", aliases: &["--max-scale"], kind: ArgKind::Number },
    ArgSpec { field: "scaler", flag: "-S", aliases: &["--scaler"], kind: ArgKind::Choice(SCALERS) },
    ArgSpec { field: "filter", flag: "-F", aliases: &["--filter"], kind: ArgKind::Choice(FILTERS) },
    ArgSpec { field: "sharpness", flag: "--sharpness", aliases: &["--fsr-sharpness"], kind: ArgKind::Number },
    ArgSpec { field: "mouse_sensitivity", flag: "-s", aliases: &["--mouse-sensitivity"], kind: ArgKind::Ratio },
    ArgSpec { field: "adaptive_sync", flag: "--adaptive-sync", aliases: &[], kind: ArgKind::Flag },
    ArgSpec { field: "force_windows_fullscreen", flag: "--force-windows-fullscreen", aliases: &[], kind: ArgKind::Flag },
    ArgSpec { field: "force_grab_cursor", flag: "--force-grab-cursor", aliases: &[], kind: ArgKind::Flag },
];

pub(crate) fn spec_for(flag: &str) -> Option<&'static ArgSpec> {
    KNOWN_ARGS
        .iter()
        .find(|spec| spec.flag == flag || spec.aliases.contains(&flag))
}

/// A `SCB_GAMESCOPE_ARGS` value split into known options and pass-through tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GamescopeArgs {
    /// Canonical flag to value; switches map to an empty string.
    values: BTreeMap<&'static str, String>,
    pub(crate) extra: Vec<String>,
}

impl GamescopeArgs {
    pub(crate) fn parse(line: &str) -> Self {
        let tokens = shell_words::split(line)
            .unwrap_or_else(|_| line.split_whitespace().map(str::to_string).collect());

        let mut args = GamescopeArgs::default();
        let mut tokens = tokens.into_iter().peekable();
        while let Some(token) = tokens.next() {
            let (name, inline) = match token.split_once('=') {
                Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
                _ => (token.as_str(), None),
            };
            let Some(spec) = spec_for(name) else {
                args.extra.push(token);
                continue;
            };

            if spec.kind == ArgKind::Flag {
                if inline.is_some() {
                    args.extra.push(token);
                } else {
                    args.values.insert(spec.flag, String::new());
                }
                continue;
            }

            let value = inline.or_else(|| tokens.next_if(|next| spec.kind.accepts(next)));
            match value {
                Some(value) if spec.kind.accepts(&value) => {
                    args.values.insert(spec.flag, value);
                }
                _ => args.extra.push(token),
            }
        }
        args
    }

    pub(crate) fn get(&self, flag: &str) -> Option<&str> {
        let spec = spec_for(flag)?;
        self.values.get(spec.flag).map(String::as_str)
    }

    pub(crate) fn is_set(&self, flag: &str) -> bool {
        self.get(flag).is_some()
    }

    /// Sets (`Some`) or removes (`None`) a known option. Switches ignore the value.
    pub(crate) fn set(&mut self, flag: &str, value: Option<&str>) -> ScbResult<()> {
        let spec = spec_for(flag).ok_or(ScbError::InvalidValue {
            field: "gamescope flag",
            reason: "not a known gamescope option",
        })?;
        match value {
            None => {
                self.values.remove(spec.flag);
            }
            Some(_) if spec.kind == ArgKind::Flag => {
                self.values.insert(spec.flag, String::new());
            }
            Some(value) if spec.kind.accepts(value) => {
                self.values.insert(spec.flag, value.to_string());
            }
            Some(_) => {
                return Err(ScbError::InvalidValue {
                    field: spec.field,
                    reason: spec.kind.expectation(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.extra.clear();
    }

    fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for spec in KNOWN_ARGS {
            let Some(value) = self.values.get(spec.flag) else {
                continue;
            };
            match spec.kind {
                ArgKind::Flag => tokens.push(spec.flag.to_string()),
                ArgKind::Ratio if value.parse::<f64>() == Ok(1.0) => {}
                _ => {
                    tokens.push(spec.flag.to_string());
                    tokens.push(value.clone());
                }
            }
        }
        tokens.extend(self.extra.iter().cloned());
        tokens
    }

    /// Known options in table order, then pass-through tokens.
    pub(crate) fn render(&self) -> String {
        shell_words::join(self.tokens())
    }

    pub(crate) fn validate(&self) -> ScbResult<()> {
        if self.is_set("-w") && !self.is_set("-h") {
            return Err(ScbError::InvalidValue {
                field: "render_width",
                reason: "-w needs -h",
            });
        }
        if self.is_set("-W") && !self.is_set("-H") {
            return Err(ScbError::InvalidValue {
                field: "output_width",
                reason: "-W needs -H",
            });
        }
        if self.extra.iter().any(|token| token.contains('"')) {
            return Err(ScbError::InvalidValue {
                field: "gamescope args",
                reason: "must not contain a double quote",
            });
        }
        Ok(())
    }

    /// `(field, value)` rows for every known option that is set.
    pub(crate) fn rows(&self) -> Vec<(&'static str, String)> {
        KNOWN_ARGS
            .iter()
            .filter_map(|spec| {
                self.values.get(spec.flag).map(|value| {
                    let shown = if spec.kind == ArgKind::Flag {
                        "on".to_string()
                    } else {
                        value.clone()
                    };
                    (spec.field, shown)
                })
            })
            .collect()
    }
}
