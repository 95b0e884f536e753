//! Naming rule shared by cluster, service and cluster-variant expansion.

/// Append `-suffix` to `base`, or return `base` unchanged when there is no
/// (or an empty) suffix.
///
/// # Example
///
/// ```rust
/// use corelib::naming::add_suffix;
///
/// assert_eq!(add_suffix("Foobar", Some("WestCoast")), "Foobar-WestCoast");
/// assert_eq!(add_suffix("Foobar", None), "Foobar");
/// ```
pub fn add_suffix(base: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if !suffix.is_empty() => format!("{}-{}", base, suffix),
        _ => base.to_string(),
    }
}
