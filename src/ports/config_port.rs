//! Settings source port.

/// Sectioned key/value settings, as found in an INI file.
///
/// Numeric getters return `default` when the key is absent or does not parse;
/// validation of the values happens in `domain::settings`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
