use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScbError {
    #[error("invalid file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: &'static str },
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    #[error("batch edit needs one replacement per prefix ({prefixes} prefixes, {replacements} replacements)")]
    MismatchedEdit { prefixes: usize, replacements: usize },
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("launcher folder '{0}' cannot be removed")]
    ProtectedLauncher(String),
    #[error("the global config cannot be renamed or removed")]
    GlobalConfigProtected,
    #[error("unable to resolve the config home (XDG_CONFIG_HOME and HOME are unset)")]
    ConfigHomeUnresolved,
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },
}

impl ScbError {
    /// Wraps an I/O failure, keeping `NotFound` distinguishable from other errors.
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ScbError::NotFound(path.to_path_buf())
        } else {
            ScbError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Rejected input; nothing was written.
    pub(crate) fn is_validation(&self) -> bool {
        matches!(
            self,
            ScbError::InvalidFileName { .. }
                | ScbError::InvalidValue { .. }
                | ScbError::MismatchedEdit { .. }
                | ScbError::AlreadyExists(_)
                | ScbError::ProtectedLauncher(_)
                | ScbError::GlobalConfigProtected
        )
    }

    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, ScbError::NotFound(_))
    }
}

pub(crate) type ScbResult<T> = Result<T, ScbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_absent_signal() {
        let err = ScbError::io(
            Path::new("/nope/scb.conf"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "/nope/scb.conf does not exist");
    }

    #[test]
    fn permission_errors_stay_io() {
        let err = ScbError::io(
            Path::new("/etc/scb.conf"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScbError::Io { .. }));
        assert!(!err.is_not_found());
    }
}
