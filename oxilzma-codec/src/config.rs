//! Encoder configuration.
//!
//! [`EncoderConfig`] bundles the stream [`Properties`] with the match-finder
//! settings. Presets come from [`LzmaLevel`]; individual fields can be
//! overridden with the `with_*` builders.
//!
//! ```
//! use oxilzma_codec::{EncoderConfig, LzmaLevel, MatchStrategy};
//!
//! let config = EncoderConfig::from_level(LzmaLevel::new(3))
//!     .with_dictionary_size(1 << 20)
//!     .with_strategy(MatchStrategy::Lazy);
//! assert!(config.validate().is_ok());
//! ```

use crate::LzmaLevel;
use crate::model::{MATCH_LEN_MAX, MATCH_LEN_MIN, Properties};
use oxilzma_core::error::{LzmaError, Result};

/// Maximum chain depth per compression level.
const CHAIN_DEPTH: [usize; 10] = [
    0,    // Level 0: no search
    4,    // Level 1: very fast
    8,    // Level 2
    16,   // Level 3
    32,   // Level 4
    64,   // Level 5
    128,  // Level 6 (default)
    256,  // Level 7
    512,  // Level 8
    1024, // Level 9: best
];

/// How the encoder looks for matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Code every byte as a literal.
    Literal,
    /// Take the best match at every position.
    Greedy,
    /// Defer a match by one byte when the next position has a longer one.
    #[default]
    Lazy,
}

impl MatchStrategy {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            MatchStrategy::Literal => "literal",
            MatchStrategy::Greedy => "greedy",
            MatchStrategy::Lazy => "lazy",
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MatchStrategy {
    type Err = LzmaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(MatchStrategy::Literal),
            "greedy" => Ok(MatchStrategy::Greedy),
            "lazy" => Ok(MatchStrategy::Lazy),
            other => Err(LzmaError::invalid_parameter(format!(
                "unknown match strategy '{other}'"
            ))),
        }
    }
}

/// Full encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Stream properties.
    pub properties: Properties,
    /// Match search strategy.
    pub strategy: MatchStrategy,
    /// Hash chain links followed per search.
    pub chain_depth: usize,
    /// Stop searching once a match this long is found (2..=273).
    pub nice_len: usize,
    /// Terminate the stream with an end marker.
    pub end_marker: bool,
}

impl EncoderConfig {
    /// Preset for a compression level.
    pub fn from_level(level: LzmaLevel) -> Self {
        let lvl = level.level();
        let strategy = match lvl {
            0 => MatchStrategy::Literal,
            1..=4 => MatchStrategy::Greedy,
            _ => MatchStrategy::Lazy,
        };
        let nice_len = match lvl {
            0..=4 => 32,
            5..=7 => 64,
            _ => MATCH_LEN_MAX,
        };

        Self {
            properties: Properties {
                dictionary_size: level.dict_size(),
                ..Properties::default()
            },
            strategy,
            chain_depth: CHAIN_DEPTH[lvl as usize],
            nice_len,
            end_marker: false,
        }
    }

    /// Replace the stream properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Set the dictionary size.
    pub fn with_dictionary_size(mut self, dictionary_size: u32) -> Self {
        self.properties.dictionary_size = dictionary_size;
        self
    }

    /// Set the literal context and literal position bits.
    pub fn with_literal_bits(mut self, lc: u32, lp: u32) -> Self {
        self.properties.lc = lc;
        self.properties.lp = lp;
        self
    }

    /// Set the position bits.
    pub fn with_pos_bits(mut self, pb: u32) -> Self {
        self.properties.pb = pb;
        self
    }

    /// Set the match strategy.
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the hash chain depth.
    pub fn with_chain_depth(mut self, chain_depth: usize) -> Self {
        self.chain_depth = chain_depth;
        self
    }

    /// Set the nice match length.
    pub fn with_nice_len(mut self, nice_len: usize) -> Self {
        self.nice_len = nice_len;
        self
    }

    /// Enable or disable the end marker.
    pub fn with_end_marker(mut self, end_marker: bool) -> Self {
        self.end_marker = end_marker;
        self
    }

    /// Check the properties and the match settings.
    pub fn validate(&self) -> Result<()> {
        self.properties.validate()?;
        if !(MATCH_LEN_MIN..=MATCH_LEN_MAX).contains(&self.nice_len) {
            return Err(LzmaError::invalid_parameter(format!(
                "nice_len = {} (expected {MATCH_LEN_MIN}..={MATCH_LEN_MAX})",
                self.nice_len
            )));
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::from_level(LzmaLevel::DEFAULT)
    }
}
