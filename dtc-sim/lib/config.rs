//! Optional parameter overrides read from a TOML file.
//!
//! Every binary runs with its preset constants when no file is given. Values
//! are pulled out of a plain [`toml::Table`]; unknown keys are ignored.

use std::{ path::Path, str::FromStr };
use rand::{ rngs::StdRng, SeedableRng };
use crate::error::{ DtcError, DtcResult };

/// A flat table of parameter overrides.
#[derive(Clone, Debug, Default)]
pub struct Config {
    table: toml::Table,
}

impl FromStr for Config {
    type Err = DtcError;

    fn from_str(s: &str) -> DtcResult<Self> {
        let table: toml::Table = s.parse()?;
        Ok(Self { table })
    }
}

impl Config {
    /// An empty set of overrides.
    pub fn empty() -> Self { Self::default() }

    /// Read overrides from a file.
    pub fn load<P>(path: P) -> DtcResult<Self>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        log::info!("loading parameter overrides from {}", path.display());
        std::fs::read_to_string(path)?.parse()
    }

    /// Read overrides from the file named by the first command-line argument,
    /// if there is one.
    pub fn from_args() -> DtcResult<Self> {
        match std::env::args().nth(1) {
            Some(path) => Self::load(path),
            None => Ok(Self::empty()),
        }
    }

    /// Return `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool { self.table.contains_key(key) }

    /// Get a floating-point value. Integers are accepted and converted.
    pub fn get_f64(&self, key: &str) -> DtcResult<Option<f64>> {
        match self.table.get(key) {
            None => Ok(None),
            Some(toml::Value::Float(x)) => Ok(Some(*x)),
            Some(toml::Value::Integer(n)) => Ok(Some(*n as f64)),
            Some(_) => Err(DtcError::WrongType {
                key: key.to_string(),
                expected: "a number",
            }),
        }
    }

    /// Get a non-negative integer value.
    pub fn get_usize(&self, key: &str) -> DtcResult<Option<usize>> {
        match self.table.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(n)) if *n >= 0 => Ok(Some(*n as usize)),
            Some(_) => Err(DtcError::WrongType {
                key: key.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }

    /// Get a required floating-point value.
    pub fn require_f64(&self, key: &str) -> DtcResult<f64> {
        self.get_f64(key)?.ok_or_else(|| DtcError::MissingKey(key.to_string()))
    }

    /// Get a floating-point value, falling back to `default`.
    pub fn f64_or(&self, key: &str, default: f64) -> DtcResult<f64> {
        Ok(self.get_f64(key)?.unwrap_or(default))
    }

    /// Get a non-negative integer value, falling back to `default`.
    pub fn usize_or(&self, key: &str, default: usize) -> DtcResult<usize> {
        Ok(self.get_usize(key)?.unwrap_or(default))
    }

    /// The random seed, if one was given.
    pub fn seed(&self) -> DtcResult<Option<u64>> {
        Ok(self.get_usize("seed")?.map(|s| s as u64))
    }

    /// Build the random number generator for a run: seeded if `seed` is
    /// present, otherwise drawn from system entropy.
    pub fn rng(&self) -> DtcResult<StdRng> {
        match self.seed()? {
            Some(seed) => {
                log::info!("using fixed seed {}", seed);
                Ok(StdRng::seed_from_u64(seed))
            },
            None => Ok(StdRng::from_entropy()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_numbers() {
        let config: Config
            = "gamma = 1e5\nsteps = 5000\nthreshold = 1e-20\nseed = 7"
            .parse()
            .unwrap();
        assert_eq!(config.f64_or("gamma", 0.0).unwrap(), 1e5);
        assert_eq!(config.usize_or("steps", 0).unwrap(), 5000);
        assert_eq!(config.f64_or("steps", 0.0).unwrap(), 5000.0);
        assert_eq!(config.f64_or("missing", 2.5).unwrap(), 2.5);
        assert_eq!(config.seed().unwrap(), Some(7));
    }

    #[test]
    fn rejects_wrong_types() {
        let config: Config = "gamma = \"fast\"\nsteps = -3".parse().unwrap();
        assert!(matches!(
            config.get_f64("gamma"),
            Err(DtcError::WrongType { .. })
        ));
        assert!(matches!(
            config.get_usize("steps"),
            Err(DtcError::WrongType { .. })
        ));
        assert!(matches!(
            config.require_f64("threshold"),
            Err(DtcError::MissingKey(_))
        ));
    }

    #[test]
    fn seeded_rngs_agree() {
        use rand::Rng;
        let config: Config = "seed = 42".parse().unwrap();
        let a: u64 = config.rng().unwrap().gen();
        let b: u64 = config.rng().unwrap().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            "gamma = = 1".parse::<Config>(),
            Err(DtcError::Toml(_))
        ));
    }
}
