//! Decoder options

/// Options of the SEQUENCE and SET header decoders
///
/// The default is what certificate and key parsing needs: definite lengths only, and the
/// content must be fully present in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Accept the indefinite length form (`0x80`). Definite lengths are then not checked
    /// against the remaining input, as stream parsers do not require the entire content.
    pub indefinite: bool,
    /// Require the announced content to fit in the remaining input
    pub strict_length: bool,
}

impl DecodeConfig {
    pub const fn new() -> Self {
        DecodeConfig {
            indefinite: false,
            strict_length: true,
        }
    }

    #[inline]
    pub const fn with_indefinite(self, indefinite: bool) -> Self {
        DecodeConfig { indefinite, ..self }
    }

    #[inline]
    pub const fn with_strict_length(self, strict_length: bool) -> Self {
        DecodeConfig {
            strict_length,
            ..self
        }
    }

    /// Whether definite lengths must be checked against the remaining input
    #[inline]
    pub(crate) const fn checks_content(&self) -> bool {
        self.strict_length && !self.indefinite
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig::new()
    }
}
