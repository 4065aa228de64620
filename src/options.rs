//! Compile options
//!
//! Options only change constants spliced into the generated program; they
//! never affect geometry. Every field has a default, so a JSON options file
//! may list any subset of them.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Invalid compile options
#[derive(Error, Debug)]
pub enum OptionsError {
    /// A field is outside its valid range
    #[error("invalid option `{field}`: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Malformed options file
    #[error("invalid options file: {0}")]
    Parse(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Program constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Hit tolerance and normal offset
    pub epsilon: f32,
    /// Maximum marching steps per bounce
    pub steps: u32,
    /// Maximum bounces per sample
    pub bounces: u32,
    /// Extra samples per pixel per frame
    pub iterations: u32,
    /// Display gamma applied by the presentation step
    pub gamma: f32,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            width: 512,
            height: 512,
            epsilon: 1e-4,
            steps: 256,
            bounces: 4,
            iterations: 0,
            gamma: 2.2,
        }
    }
}

impl Options {
    /// Set resolution
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set hit tolerance
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set marching steps
    #[must_use]
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Set bounce count
    #[must_use]
    pub fn with_bounces(mut self, bounces: u32) -> Self {
        self.bounces = bounces;
        self
    }

    /// Set extra samples per frame
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set display gamma
    #[must_use]
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Samples taken per pixel per frame
    #[inline]
    pub fn samples(&self) -> u32 {
        self.iterations + 1
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), OptionsError> {
        let invalid = |field, reason| Err(OptionsError::Invalid { field, reason });
        if self.width == 0 {
            return invalid("width", "must be positive");
        }
        if self.height == 0 {
            return invalid("height", "must be positive");
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid("epsilon", "must be a positive finite number");
        }
        if self.steps == 0 {
            return invalid("steps", "must be positive");
        }
        if self.bounces == 0 {
            return invalid("bounces", "must be positive");
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return invalid("gamma", "must be a positive finite number");
        }
        Ok(())
    }

    /// Parse from a JSON string; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(json).map_err(|e| OptionsError::Parse(e.to_string()))
    }

    /// Parse from a JSON file (buffered)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| OptionsError::Parse(e.to_string()))
    }
}
