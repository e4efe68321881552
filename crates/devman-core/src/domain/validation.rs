use crate::domain::error::DomainError;

/// Names that collide with Windows device files or with the Python toolchain.
const RESERVED_NAMES: &[&str] = &[
    "con",
    "prn",
    "aux",
    "nul",
    "python",
    "pip",
    "setuptools",
    "src",
    "lib",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 100;

/// Centralized validation for user-supplied project options.
///
/// All validation logic lives here, not scattered across entities.
pub struct ProjectValidator;

impl ProjectValidator {
    /// Project names: `^[a-zA-Z_][a-zA-Z0-9_-]*$`, 2-100 chars, not reserved.
    pub fn validate_project_name(name: &str) -> Result<(), DomainError> {
        let reject = |reason: &str| DomainError::InvalidProjectName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let len = name.chars().count();
        if len < NAME_MIN_LEN {
            return Err(reject("must be at least 2 characters long"));
        }
        if len > NAME_MAX_LEN {
            return Err(reject("must be at most 100 characters long"));
        }
        if name.starts_with('-') {
            return Err(reject("cannot start with a hyphen"));
        }
        if name.ends_with('-') || name.ends_with('_') {
            return Err(reject("cannot end with a hyphen or underscore"));
        }
        if !Self::is_identifier_like(name, true) {
            return Err(reject(
                "must start with a letter or underscore and contain only letters, digits, '-' and '_'",
            ));
        }
        if RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(name))
        {
            return Err(reject("is a reserved name"));
        }

        Ok(())
    }

    /// Python package names: `^[a-zA-Z_][a-zA-Z0-9_]*$` and not a keyword.
    pub fn validate_package_name(name: &str) -> Result<(), DomainError> {
        let reject = |reason: &str| DomainError::InvalidPackageName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if !Self::is_identifier_like(name, false) {
            return Err(reject("is not a valid Python identifier"));
        }
        if PYTHON_KEYWORDS.contains(&name) {
            return Err(reject("is a Python keyword"));
        }

        Ok(())
    }

    fn is_identifier_like(value: &str, allow_hyphen: bool) -> bool {
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return false;
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || (allow_hyphen && c == '-'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_project_names() {
        for name in ["my-api", "data_tools", "service2", "_private", "Ab"] {
            assert!(
                ProjectValidator::validate_project_name(name).is_ok(),
                "{name} should be accepted"
            );
        }
    }

    #[test]
    fn rejects_short_and_long_names() {
        assert!(ProjectValidator::validate_project_name("a").is_err());
        assert!(ProjectValidator::validate_project_name(&"a".repeat(101)).is_err());
        assert!(ProjectValidator::validate_project_name(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn rejects_bad_edges() {
        assert!(ProjectValidator::validate_project_name("-api").is_err());
        assert!(ProjectValidator::validate_project_name("api-").is_err());
        assert!(ProjectValidator::validate_project_name("api_").is_err());
        assert!(ProjectValidator::validate_project_name("1api").is_err());
    }

    #[test]
    fn rejects_reserved_names_case_insensitively() {
        for name in ["python", "PIP", "Src", "CON", "lib"] {
            let err = ProjectValidator::validate_project_name(name).unwrap_err();
            assert!(matches!(err, DomainError::InvalidProjectName { .. }));
        }
    }

    #[test]
    fn rejects_illegal_characters() {
        assert!(ProjectValidator::validate_project_name("my api").is_err());
        assert!(ProjectValidator::validate_project_name("my.api").is_err());
        assert!(ProjectValidator::validate_project_name("my/api").is_err());
    }

    #[test]
    fn package_names_follow_python_identifiers() {
        assert!(ProjectValidator::validate_package_name("my_api").is_ok());
        assert!(ProjectValidator::validate_package_name("my-api").is_err());
        assert!(ProjectValidator::validate_package_name("").is_err());
        assert!(ProjectValidator::validate_package_name("class").is_err());
        assert!(ProjectValidator::validate_package_name("None").is_err());
    }
}
