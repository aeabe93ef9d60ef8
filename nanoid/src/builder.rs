//! Generator configuration
//!
//! This module provides the serializable [`Config`] for a [`Generator`] and a
//! builder that applies options in order, validating each as it is applied.
//! The first invalid option is remembered and reported by
//! [`GeneratorBuilder::build`], no partially valid generator is ever produced.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Alphabet, ConfigError, Generator, source::OsSource};

/// Configuration of a [`Generator`].
///
/// The random source is not part of the serialized form and is supplied
/// programmatically, see [`GeneratorBuilder::random_source`].
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The symbols identifiers are drawn from, one to 256 characters.
    /// The default alphabet is used when absent.
    #[serde(default)]
    pub alphabet: Option<String>,
}

/// Builder for [`Generator`]
///
/// Starts from the default configuration: the operating system's random
/// source and the default alphabet.
#[derive(Debug)]
pub struct GeneratorBuilder<S = OsSource> {
    source: Option<S>,
    alphabet: Option<Alphabet>,
    error: Option<ConfigError>,
}

impl GeneratorBuilder<OsSource> {
    /// Create a new generator builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: Some(OsSource),
            alphabet: None,
            error: None,
        }
    }
}

impl Default for GeneratorBuilder<OsSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> GeneratorBuilder<S> {
    /// Draw identifiers from the characters of `symbols`
    ///
    /// Fails the build with [`ConfigError::EmptyAlphabet`] or
    /// [`ConfigError::AlphabetTooLong`] when `symbols` is not a valid
    /// [`Alphabet`].
    #[must_use]
    pub fn alphabet<A>(self, symbols: A) -> Self
    where
        A: AsRef<str>,
    {
        self.with_alphabet(|| Alphabet::new(symbols.as_ref()))
    }

    /// Draw identifiers from the bytes of `symbols`, see
    /// [`Alphabet::from_bytes`]
    ///
    /// Fails the build with [`ConfigError::EmptyAlphabet`] or
    /// [`ConfigError::AlphabetTooLong`] when `symbols` is not a valid
    /// [`Alphabet`].
    #[must_use]
    pub fn byte_alphabet<B>(self, symbols: B) -> Self
    where
        B: AsRef<[u8]>,
    {
        self.with_alphabet(|| Alphabet::from_bytes(symbols.as_ref()))
    }

    fn with_alphabet<F>(mut self, alphabet: F) -> Self
    where
        F: FnOnce() -> Result<Alphabet, ConfigError>,
    {
        if self.error.is_none() {
            match alphabet() {
                Ok(alphabet) => self.alphabet = Some(alphabet),
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    /// Draw randomness from `source`
    ///
    /// Fails the build with [`ConfigError::MissingRandomSource`] when `source`
    /// is `None`.
    #[must_use]
    pub fn random_source<T>(self, source: Option<T>) -> GeneratorBuilder<T> {
        let error = match (self.error, &source) {
            (Some(err), _) => Some(err),
            (None, None) => Some(ConfigError::MissingRandomSource),
            (None, Some(_)) => None,
        };

        GeneratorBuilder {
            source,
            alphabet: self.alphabet,
            error,
        }
    }

    /// Apply every option set in `config`
    #[must_use]
    pub fn config(self, config: &Config) -> Self {
        match &config.alphabet {
            Some(symbols) => self.alphabet(symbols),
            None => self,
        }
    }

    /// Build the generator
    ///
    /// # Errors
    ///
    /// Returns the error of the first invalid option applied, see
    /// [`ConfigError`].
    pub fn build(self) -> Result<Generator<S>, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let source = self.source.ok_or(ConfigError::MissingRandomSource)?;

        debug!(
            alphabet = self.alphabet.as_ref().map(Alphabet::as_str),
            mask = self.alphabet.as_ref().map(Alphabet::mask),
            "identifier generator configured"
        );
        Ok(Generator::from_parts(source, self.alphabet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_ALPHABET_SIZE, ReaderSource};
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn default_build_uses_default_alphabet() {
        let generator = GeneratorBuilder::new().build().expect("default is valid");
        assert!(generator.alphabet().is_none());
        assert_eq!(generator.symbols(), crate::DEFAULT_ALPHABET);
        assert_eq!(*generator.source(), OsSource);
    }

    #[test]
    fn alphabet_option_sets_mask() {
        let generator = GeneratorBuilder::new()
            .alphabet("0123456789abcdef")
            .build()
            .expect("valid alphabet");
        let alphabet = generator.alphabet().expect("custom alphabet");
        assert_eq!(alphabet.as_str(), "0123456789abcdef");
        assert_eq!(alphabet.mask(), 15);
    }

    #[test]
    fn later_alphabet_replaces_earlier() {
        let generator = GeneratorBuilder::new()
            .alphabet("ab")
            .alphabet("xyz")
            .build()
            .expect("valid alphabets");
        assert_eq!(generator.symbols(), "xyz");
    }

    #[test]
    fn empty_alphabet_fails_build() {
        let result = GeneratorBuilder::new().alphabet("").build();
        assert!(matches!(result, Err(ConfigError::EmptyAlphabet)));
    }

    #[test]
    fn oversized_alphabet_fails_build() {
        let symbols = "z".repeat(MAX_ALPHABET_SIZE + 1);
        let result = GeneratorBuilder::new().alphabet(&symbols).build();
        assert!(matches!(
            result,
            Err(ConfigError::AlphabetTooLong { len: 257 })
        ));
    }

    #[test]
    fn multi_byte_alphabet_builds() {
        let generator = GeneratorBuilder::new()
            .alphabet("αβγ")
            .build()
            .expect("three symbols");
        let alphabet = generator.alphabet().expect("custom alphabet");
        assert_eq!(alphabet.len(), 3);
        assert_eq!(alphabet.mask(), 3);
        assert_eq!(generator.symbols(), "αβγ");

        let config: Config = serde_yaml::from_str("alphabet: \"αβγ\"").expect("valid yaml");
        let generator = Generator::from_config(&config).expect("valid config");
        let id = generator.new_id(32).expect("os randomness available");
        assert_eq!(id.chars().count(), 32);
        assert!(id.chars().all(|c| alphabet.contains(c)));
    }

    #[test]
    fn byte_alphabet_option() {
        let generator = GeneratorBuilder::new()
            .byte_alphabet(b"01")
            .build()
            .expect("two symbols");
        assert_eq!(generator.alphabet().map(Alphabet::mask), Some(1));

        let result = GeneratorBuilder::new().byte_alphabet(b"").build();
        assert!(matches!(result, Err(ConfigError::EmptyAlphabet)));
    }

    #[test]
    fn absent_source_fails_build() {
        let result = GeneratorBuilder::new()
            .random_source(None::<ReaderSource<Cursor<Vec<u8>>>>)
            .build();
        assert!(matches!(result, Err(ConfigError::MissingRandomSource)));
    }

    #[test]
    fn first_invalid_option_wins() {
        // An invalid alphabet applied before an absent source is reported,
        // and a valid alphabet applied afterwards does not clear it.
        let result = GeneratorBuilder::new()
            .alphabet("")
            .random_source(None::<OsSource>)
            .alphabet("abc")
            .build();
        assert!(matches!(result, Err(ConfigError::EmptyAlphabet)));

        let result = GeneratorBuilder::new()
            .random_source(None::<OsSource>)
            .alphabet("")
            .build();
        assert!(matches!(result, Err(ConfigError::MissingRandomSource)));
    }

    #[test]
    fn config_round_trips_through_builder() {
        let config = Config {
            alphabet: Some("abc".to_string()),
        };
        let generator = Generator::from_config(&config).expect("valid config");
        assert_eq!(generator.symbols(), "abc");

        let generator = Generator::from_config(&Config::default()).expect("valid config");
        assert!(generator.alphabet().is_none());

        let source = ReaderSource::new(Cursor::new(vec![0u8, 1, 2, 3, 3, 3, 3]));
        let generator =
            Generator::from_config_with_source(&config, Some(source)).expect("valid config");
        assert_eq!(generator.new_id(3).expect("enough bytes"), "abc");

        let result = Generator::<OsSource>::from_config_with_source(&config, None);
        assert!(matches!(result, Err(ConfigError::MissingRandomSource)));
    }

    #[test]
    fn config_deserializes() {
        let config: Config = serde_yaml::from_str("alphabet: \"0123456789\"").expect("valid yaml");
        assert_eq!(config.alphabet.as_deref(), Some("0123456789"));

        let config: Config = serde_yaml::from_str("{}").expect("valid yaml");
        assert_eq!(config, Config::default());

        let result: Result<Config, _> = serde_yaml::from_str("alphabet: abc\nsize: 3");
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn builder_accepts_every_valid_length(len in 1..=MAX_ALPHABET_SIZE) {
            let symbols: String = (0..len).map(|i| char::from(b'!' + (i % 90) as u8)).collect();
            let generator = GeneratorBuilder::new().alphabet(&symbols).build();
            prop_assert!(generator.is_ok());
        }

        #[test]
        fn builder_rejects_every_oversized_length(extra in 1..1024_usize) {
            let symbols = "q".repeat(MAX_ALPHABET_SIZE + extra);
            let result = GeneratorBuilder::new().alphabet(&symbols).build();
            let too_long = matches!(result, Err(ConfigError::AlphabetTooLong { .. }));
            prop_assert!(too_long, "unexpected result: {:?}", result);
        }
    }
}
