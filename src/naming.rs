//! Component name conventions.
//!
//! Names are plain strings. A leading [`PRODUCER_PREFIX`] on a *requested* name
//! selects the producer object itself instead of the object it produces:
//!
//! - `get_bean("printer")` returns what the `printer` producer produces
//! - `get_bean("&printer")` returns the producer
//!
//! The prefix is only meaningful at lookup time; definitions are always
//! registered under the bare name.

/// Leading sentinel that selects "the producer itself" on lookup.
pub const PRODUCER_PREFIX: char = '&';

/// Reserved separator of synthetic names; registered names may not contain it.
pub const PRODUCT_SEPARATOR: char = '#';

/// Suffix of the synthetic name under which a cacheable product is stored.
pub const PRODUCT_SUFFIX: &str = "#product";

/// A requested name split into the registered name and the producer flag.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::naming::RequestedName;
///
/// let plain = RequestedName::parse("printer");
/// assert_eq!(plain.canonical, "printer");
/// assert!(!plain.wants_producer);
///
/// let producer = RequestedName::parse("&printer");
/// assert_eq!(producer.canonical, "printer");
/// assert!(producer.wants_producer);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedName<'a> {
    /// The name the definition is registered under
    pub canonical: &'a str,
    /// Whether the caller asked for the producer rather than its product
    pub wants_producer: bool,
}

impl<'a> RequestedName<'a> {
    /// Parses a requested name. Repeated prefixes are tolerated.
    pub fn parse(requested: &'a str) -> Self {
        let canonical = requested.trim_start_matches(PRODUCER_PREFIX);
        Self {
            canonical,
            wants_producer: canonical.len() != requested.len(),
        }
    }
}

/// Returns the lookup name that selects the producer registered under `name`.
pub fn producer_reference(name: &str) -> String {
    format!("{PRODUCER_PREFIX}{}", canonical_name(name))
}

/// Strips any producer prefix from a requested name.
pub fn canonical_name(requested: &str) -> &str {
    RequestedName::parse(requested).canonical
}

/// Whether `name` may be used to register a definition.
pub(crate) fn is_registrable(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(PRODUCER_PREFIX) && !name.contains(PRODUCT_SEPARATOR)
}

/// Synthetic cache name for the product of a cacheable producer.
pub(crate) fn product_name(name: &str) -> String {
    format!("{name}{PRODUCT_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_prefix_is_stripped() {
        let parsed = RequestedName::parse("&&factory");
        assert_eq!(parsed.canonical, "factory");
        assert!(parsed.wants_producer);
    }

    #[test]
    fn producer_reference_is_idempotent() {
        assert_eq!(producer_reference("p"), "&p");
        assert_eq!(producer_reference("&p"), "&p");
    }

    #[test]
    fn product_name_is_distinct_from_registered_name() {
        assert_eq!(product_name("p"), "p#product");
        assert_ne!(product_name("p"), "p");
        assert!(!is_registrable(&product_name("p")));
    }

    #[test]
    fn registrable_names() {
        assert!(is_registrable("printer"));
        assert!(is_registrable("a.b-c"));
        assert!(!is_registrable(""));
        assert!(!is_registrable("&printer"));
        assert!(!is_registrable("printer#product"));
    }
}
