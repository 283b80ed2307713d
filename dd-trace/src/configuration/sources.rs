// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Layered lookup of configuration values.
//!
//! Layers are consulted in order and the first raw value that parses wins. Values
//! that fail to parse are kept as rejections, tagged with the layer they came from,
//! and reported when the lookup is resolved.

use std::{fmt, str::FromStr};

use crate::configuration::supported_configurations::SupportedConfigurations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSourceOrigin {
    EnvVar,
    /// Layers built in code, only tests stack them on top of the environment
    #[cfg(test)]
    Code,
}

impl fmt::Display for ConfigSourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match self {
            ConfigSourceOrigin::EnvVar => "env_var",
            #[cfg(test)]
            ConfigSourceOrigin::Code => "code",
        };
        write!(f, "{origin}")
    }
}

/// One layer of raw string values
pub(crate) trait ConfigLayer {
    fn origin(&self) -> ConfigSourceOrigin;

    fn raw(&self, key: &'static str) -> Option<String>;
}

pub(crate) struct EnvLayer;

impl ConfigLayer for EnvLayer {
    fn origin(&self) -> ConfigSourceOrigin {
        ConfigSourceOrigin::EnvVar
    }

    fn raw(&self, key: &'static str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
pub(crate) struct MapLayer {
    entries: std::collections::HashMap<&'static str, &'static str>,
    origin: ConfigSourceOrigin,
}

#[cfg(test)]
impl MapLayer {
    pub(crate) fn new<const N: usize>(
        entries: [(&'static str, &'static str); N],
        origin: ConfigSourceOrigin,
    ) -> Self {
        MapLayer {
            entries: entries.into_iter().collect(),
            origin,
        }
    }
}

#[cfg(test)]
impl ConfigLayer for MapLayer {
    fn origin(&self) -> ConfigSourceOrigin {
        self.origin
    }

    fn raw(&self, key: &'static str) -> Option<String> {
        self.entries.get(key).map(|value| value.to_string())
    }
}

/// A raw value that could not be parsed
#[derive(Debug, PartialEq)]
pub(crate) struct Rejected {
    pub(crate) raw: String,
    pub(crate) origin: ConfigSourceOrigin,
    pub(crate) expected: &'static str,
    pub(crate) reason: String,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not parse {:?} from {} as {}: {}",
            self.raw, self.origin, self.expected, self.reason
        )
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct Lookup<T> {
    pub(crate) key: SupportedConfigurations,
    pub(crate) found: Option<(T, ConfigSourceOrigin)>,
    pub(crate) rejected: Vec<Rejected>,
}

impl<T> Lookup<T> {
    /// Logs the rejected values and returns the value found, if any
    pub(crate) fn resolve(self) -> Option<T> {
        for rejected in &self.rejected {
            crate::dd_warn!("Config: ignoring {}, {}", self.key.as_str(), rejected);
        }
        self.found.map(|(value, _)| value)
    }
}

/// Layers of configuration, highest precedence first
#[derive(Default)]
pub(crate) struct ConfigLayers {
    layers: Vec<Box<dyn ConfigLayer>>,
}

impl ConfigLayers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_env() -> Self {
        let mut layers = Self::new();
        layers.push(EnvLayer);
        layers
    }

    pub(crate) fn push<L: ConfigLayer + 'static>(&mut self, layer: L) {
        self.layers.push(Box::new(layer));
    }

    pub(crate) fn lookup<T>(&self, key: SupportedConfigurations) -> Lookup<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let mut rejected = Vec::new();
        for layer in &self.layers {
            // a blank value is the same as an unset one
            let Some(raw) = layer
                .raw(key.as_str())
                .filter(|raw| !raw.trim().is_empty())
            else {
                continue;
            };
            match raw.parse::<T>() {
                Ok(value) => {
                    return Lookup {
                        key,
                        found: Some((value, layer.origin())),
                        rejected,
                    }
                }
                Err(err) => rejected.push(Rejected {
                    raw,
                    origin: layer.origin(),
                    expected: std::any::type_name::<T>(),
                    reason: err.to_string(),
                }),
            }
        }
        Lookup {
            key,
            found: None,
            rejected,
        }
    }
}
