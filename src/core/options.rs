//! Requested build options.

use serde::Serialize;
use thiserror::Error;

use crate::core::formula::Formula;

/// CLI spellings of the variant options, as declared in formulas.
pub const UNIVERSAL: &str = "universal";
pub const CXX11: &str = "cxx11";
pub const WITH_MPI: &str = "with-mpi";
pub const WITHOUT_PYTHON: &str = "without-python";
pub const WITH_ICU: &str = "with-icu";
pub const WITH_LOG: &str = "with-log";

/// The build variant a user asked for.
///
/// Flags are independent of one another except `universal`, which interacts
/// with `without_python` during validation. `head` is not a variant flag;
/// it selects which source to build from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
    pub universal: bool,
    pub cxx11: bool,
    pub with_mpi: bool,
    pub without_python: bool,
    pub with_icu: bool,
    pub with_log: bool,
    pub head: bool,
}

/// A requested option the formula does not declare.
#[derive(Debug, Error)]
#[error("option '--{option}' is not declared by formula '{formula}'")]
pub struct UnknownOption {
    pub formula: String,
    pub option: String,
}

impl BuildOptions {
    /// Names of the variant options that are set.
    pub fn requested(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.universal {
            names.push(UNIVERSAL);
        }
        if self.cxx11 {
            names.push(CXX11);
        }
        if self.with_mpi {
            names.push(WITH_MPI);
        }
        if self.without_python {
            names.push(WITHOUT_PYTHON);
        }
        if self.with_icu {
            names.push(WITH_ICU);
        }
        if self.with_log {
            names.push(WITH_LOG);
        }
        names
    }

    /// Check every requested option against the formula's declarations.
    pub fn check_declared(&self, formula: &Formula) -> Result<(), UnknownOption> {
        for name in self.requested() {
            if !formula.has_option(name) {
                return Err(UnknownOption {
                    formula: formula.package.name.clone(),
                    option: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::boost_formula;

    #[test]
    fn test_requested_names() {
        let options = BuildOptions {
            universal: true,
            with_icu: true,
            head: true,
            ..Default::default()
        };

        // head selects the source, not the variant
        assert_eq!(options.requested(), vec![UNIVERSAL, WITH_ICU]);
        assert!(BuildOptions::default().requested().is_empty());
    }

    #[test]
    fn test_check_declared_accepts_known_options() {
        let formula = boost_formula();
        let options = BuildOptions {
            universal: true,
            cxx11: true,
            with_mpi: true,
            without_python: true,
            with_icu: true,
            with_log: true,
            head: false,
        };

        options.check_declared(&formula).unwrap();
    }

    #[test]
    fn test_check_declared_rejects_unknown_option() {
        let mut formula = boost_formula();
        formula.options.retain(|o| o.name != WITH_MPI);

        let options = BuildOptions {
            with_mpi: true,
            ..Default::default()
        };

        let err = options.check_declared(&formula).unwrap_err();
        assert_eq!(err.option, WITH_MPI);
        assert_eq!(err.formula, "boost");
    }
}
