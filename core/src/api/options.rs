//! Configuration options for the Tarn engine.

/// Configuration options for the Tarn engine.
///
/// # Example
///
/// ```
/// use tarn_core::api::EngineOptions;
///
/// let options = EngineOptions {
///     prelude: false,
///     ..EngineOptions::default()
/// };
/// assert_eq!(options.preview_len, 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Prepend the standard prelude to every program.
    ///
    /// Without it, operators such as `+` are unbound until the program
    /// declares them.
    ///
    /// Default: true
    pub prelude: bool,

    /// Parenthesize every operator application when rendering programs and
    /// values.
    ///
    /// Default: false
    pub braced_output: bool,

    /// Maximum number of characters of a node's text quoted in a diagnostic
    /// message.
    ///
    /// Default: 40
    pub preview_len: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            prelude: true,
            braced_output: false,
            preview_len: crate::diagnostics::DEFAULT_PREVIEW_LEN,
        }
    }
}
