//! Configuration access port trait.

/// Typed lookup over (section, key) pairs. `None` covers both a missing key
/// and a value that does not parse as the requested type; callers layer
/// their own defaults (command-line flags win over config values).
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Option<i64>;
    fn get_double(&self, section: &str, key: &str) -> Option<f64>;
    fn get_bool(&self, section: &str, key: &str) -> Option<bool>;
}
