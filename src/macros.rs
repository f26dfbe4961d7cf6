/// Compile a static pattern once and hand out a `&'static Regex`.
///
/// Only for literals written in this crate; rule tables loaded at runtime go
/// through [`crate::rules`] and report invalid patterns as configuration errors.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
