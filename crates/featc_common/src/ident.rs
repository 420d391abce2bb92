//! Module-name validation.

/// Returns `true` if `name` is a valid module name.
///
/// Module names come from the `Feature:` header and may contain only ASCII
/// letters and underscores.
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
}
