//! Bind-variable placeholders.

/// Returns the placeholder for a 1-based parameter position (`$1`, `$2`, ...).
#[must_use]
pub fn bind_var(position: usize) -> String {
    format!("${position}")
}
