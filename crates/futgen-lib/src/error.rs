//! Unified error type for the futgen-lib crate.
//!
//! [`FutgenError`] wraps module-specific errors (`RegulatoryError`, `RoleError`)
//! and domain-specific error kinds (`Template`, `Capability`, `Config`).
//! `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::regulatory::RegulatoryError;
use crate::roles::RoleError;

/// Unified error type for futgen-lib operations.
#[derive(Debug)]
pub enum FutgenError {
    /// Regulatory table lookup or argument error.
    Regulatory(RegulatoryError),
    /// Interface role token error.
    Role(RoleError),
    /// Standard I/O error (document loading, config persistence).
    Io(std::io::Error),
    /// JSON document could not be parsed.
    Json(String),
    /// Malformed test template (row shape, missing args_mapping).
    Template(String),
    /// Capability document missing or unusable.
    Capability(String),
    /// Tool configuration error.
    Config(String),
}

impl FutgenError {
    /// Whether the error must abort the whole generation run.
    ///
    /// Template and role errors are local to one test case; everything that
    /// signals missing rule or capability data is fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            FutgenError::Regulatory(RegulatoryError::InvalidArgument(_)) => false,
            FutgenError::Regulatory(RegulatoryError::LookupFailure(_)) => true,
            FutgenError::Role(_) | FutgenError::Template(_) => false,
            FutgenError::Io(_)
            | FutgenError::Json(_)
            | FutgenError::Capability(_)
            | FutgenError::Config(_) => true,
        }
    }
}

impl fmt::Display for FutgenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FutgenError::Regulatory(e) => write!(f, "{e}"),
            FutgenError::Role(e) => write!(f, "{e}"),
            FutgenError::Io(e) => write!(f, "I/O error: {e}"),
            FutgenError::Json(e) => write!(f, "JSON error: {e}"),
            FutgenError::Template(e) => write!(f, "Template error: {e}"),
            FutgenError::Capability(e) => write!(f, "Capability error: {e}"),
            FutgenError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for FutgenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FutgenError::Regulatory(e) => Some(e),
            FutgenError::Role(e) => Some(e),
            FutgenError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegulatoryError> for FutgenError {
    fn from(e: RegulatoryError) -> Self {
        FutgenError::Regulatory(e)
    }
}

impl From<RoleError> for FutgenError {
    fn from(e: RoleError) -> Self {
        FutgenError::Role(e)
    }
}

impl From<std::io::Error> for FutgenError {
    fn from(e: std::io::Error) -> Self {
        FutgenError::Io(e)
    }
}

/// Crate-level Result alias using [`FutgenError`].
pub type Result<T> = std::result::Result<T, FutgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_regulatory_error() {
        let e: FutgenError = RegulatoryError::LookupFailure("no table".into()).into();
        assert!(matches!(
            e,
            FutgenError::Regulatory(RegulatoryError::LookupFailure(_))
        ));
    }

    #[test]
    fn from_role_error() {
        let e: FutgenError = RoleError::UnsupportedToken("FutGen|bogus".into()).into();
        assert!(matches!(e, FutgenError::Role(RoleError::UnsupportedToken(_))));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: FutgenError = io_err.into();
        assert!(matches!(e, FutgenError::Io(_)));
    }

    #[test]
    fn display_template_error() {
        let e = FutgenError::Template("row length 3 != args_mapping length 4".into());
        assert_eq!(
            e.to_string(),
            "Template error: row length 3 != args_mapping length 4"
        );
    }

    #[test]
    fn display_capability_error() {
        let e = FutgenError::Capability("no such model".into());
        assert_eq!(e.to_string(), "Capability error: no such model");
    }

    #[test]
    fn display_wraps_module_error() {
        let e = FutgenError::Regulatory(RegulatoryError::InvalidArgument("HT42".into()));
        assert!(e.to_string().contains("HT42"));
    }

    // ── is_fatal ──

    #[test]
    fn lookup_failure_is_fatal() {
        let e = FutgenError::Regulatory(RegulatoryError::LookupFailure("x".into()));
        assert!(e.is_fatal());
    }

    #[test]
    fn template_and_role_errors_are_local() {
        assert!(!FutgenError::Template("x".into()).is_fatal());
        assert!(!FutgenError::Role(RoleError::UnsupportedToken("x".into())).is_fatal());
        assert!(
            !FutgenError::Regulatory(RegulatoryError::InvalidArgument("x".into())).is_fatal()
        );
    }

    #[test]
    fn io_and_capability_errors_are_fatal() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(FutgenError::Io(io_err).is_fatal());
        assert!(FutgenError::Capability("x".into()).is_fatal());
    }

    #[test]
    fn source_chains_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e = FutgenError::Io(io_err);
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("denied"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = FutgenError::Json("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_regulatory_to_futgen() {
        fn inner() -> std::result::Result<(), RegulatoryError> {
            Err(RegulatoryError::LookupFailure("gone".into()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(err.is_fatal());
    }
}
