//! Option-validation findings.

use std::fmt;

use serde::Serialize;

use crate::inspect::InspectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// The requested combination cannot build; no plan is produced.
    Blocking,
    /// Worth telling the user, but the plan is still valid.
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    NonUniversalPython,
    PythonNotInspectable,
    MissingIcuPrefix,
    Cxx11LinkCompatibility,
    ProvisionalLogAddon,
}

/// One reported incompatibility or heads-up for a set of build options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub summary: String,
    /// Longer explanation shown under the summary, when one helps.
    pub detail: Option<String>,
}

impl ValidationIssue {
    pub fn non_universal_python(python: &str) -> Self {
        ValidationIssue {
            kind: IssueKind::NonUniversalPython,
            severity: Severity::Blocking,
            summary: format!("universal build requested, but `{python}` is not a universal build"),
            detail: Some(
                "the build links against whichever python it finds in the path; \
                 a single-architecture python will make the link step fail"
                    .to_string(),
            ),
        }
    }

    pub fn python_not_inspectable(python: &str, reason: &InspectError) -> Self {
        ValidationIssue {
            kind: IssueKind::PythonNotInspectable,
            severity: Severity::Blocking,
            summary: format!("cannot tell whether `{python}` is a universal build"),
            detail: Some(reason.to_string()),
        }
    }

    pub fn missing_icu_prefix() -> Self {
        ValidationIssue {
            kind: IssueKind::MissingIcuPrefix,
            severity: Severity::Blocking,
            summary: "icu support requested, but icu4c is not installed".to_string(),
            detail: Some(
                "the bootstrap step needs an icu installation prefix to point the \
                 build at; install icu4c first or drop --with-icu"
                    .to_string(),
            ),
        }
    }

    pub fn cxx11_link_compatibility() -> Self {
        ValidationIssue {
            kind: IssueKind::Cxx11LinkCompatibility,
            severity: Severity::Advisory,
            summary: "building in C++11 mode changes the library ABI".to_string(),
            detail: Some(
                "every library that links against boost must be built in C++11 \
                 mode as well"
                    .to_string(),
            ),
        }
    }

    pub fn provisional_log_addon() -> Self {
        ValidationIssue {
            kind: IssueKind::ProvisionalLogAddon,
            severity: Severity::Advisory,
            summary: "boost.log is provisionally accepted and not part of the boost release"
                .to_string(),
            detail: Some(
                "the add-on tree is merged into the boost sources before building; \
                 its interfaces may still change before an official release"
                    .to_string(),
            ),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}
