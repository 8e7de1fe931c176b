//! Configuration file support
//!
//! Every field has a default, so a configuration file only needs to list
//! what it changes.

use crate::contact::MembershipPolicy;
use crate::error::{Result, TetDeckError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Linear elastic material assigned to every element
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Material name in the deck
    pub name: String,

    /// Young's modulus (Pa)
    pub youngs_modulus: f64,

    pub poissons_ratio: f64,

    /// Density (kg/m^3)
    pub density: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            name: "SANDSTONE".to_string(),
            youngs_modulus: 13_990_000_000.0,
            poissons_ratio: 0.29,
            density: 2397.0,
        }
    }
}

/// Surface interaction between the master and slave surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Coulomb friction coefficient
    pub friction_coefficient: f64,

    /// Slope of the linear pressure-overclosure curve, 10 x E when unset
    pub penalty_stiffness: Option<f64>,

    /// Stick slope of the friction law, E / 10 when unset
    pub stick_slope: Option<f64>,

    /// Second value of the pressure-overclosure line
    pub overclosure_tension: f64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            friction_coefficient: 0.48,
            penalty_stiffness: None,
            stick_slope: None,
            overclosure_tension: 3.0,
        }
    }
}

impl ContactConfig {
    /// Penalty stiffness for a given Young's modulus
    pub fn penalty_stiffness_for(&self, youngs_modulus: f64) -> f64 {
        self.penalty_stiffness.unwrap_or(youngs_modulus * 10.0)
    }

    /// Stick slope for a given Young's modulus
    pub fn stick_slope_for(&self, youngs_modulus: f64) -> f64 {
        self.stick_slope.unwrap_or(youngs_modulus / 10.0)
    }
}

/// Analysis procedure of the single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepProcedure {
    Static,
    Dynamic,
}

impl StepProcedure {
    /// Deck keyword for this procedure
    pub fn keyword(self) -> &'static str {
        match self {
            StepProcedure::Static => "*STATIC",
            StepProcedure::Dynamic => "*DYNAMIC",
        }
    }
}

/// The load step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub procedure: StepProcedure,

    /// Geometric nonlinearity
    pub nlgeom: bool,

    pub initial_increment: f64,

    pub period: f64,

    /// Gravity magnitude (m/s^2)
    pub gravity: f64,

    pub gravity_direction: [f64; 3],
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            procedure: StepProcedure::Dynamic,
            nlgeom: true,
            initial_increment: 0.01,
            period: 0.5,
            gravity: 9.81,
            gravity_direction: [0.0, 0.0, -1.0],
        }
    }
}

/// Length unit of the written deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// SI units, as the input geometry is given
    #[default]
    Meters,

    /// mm, kg, N, s
    Millimeters,
}

impl Units {
    /// Factor applied to coordinates
    pub fn length_scale(self) -> f64 {
        match self {
            Units::Meters => 1.0,
            Units::Millimeters => 1000.0,
        }
    }

    /// Convert a stress or modulus given in Pa
    pub fn stress(self, pascals: f64) -> f64 {
        match self {
            Units::Meters => pascals,
            // N/mm^2
            Units::Millimeters => pascals / 1e6,
        }
    }

    /// Convert a density given in kg/m^3
    pub fn density(self, kg_per_m3: f64) -> f64 {
        match self {
            Units::Meters => kg_per_m3,
            // kg/mm^3
            Units::Millimeters => kg_per_m3 / 1e9,
        }
    }

    /// Deck heading line
    pub fn heading(self) -> &'static str {
        match self {
            Units::Meters => "Generated FEA model",
            Units::Millimeters => "Generated FEA model, mm, kg, N, s",
        }
    }
}

/// Contact face tagging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    pub policy: MembershipPolicy,

    /// Stop at the first matching face of each element; policy default when unset
    pub first_match_only: Option<bool>,
}

impl TaggingConfig {
    pub fn first_match_only(&self) -> bool {
        self.first_match_only
            .unwrap_or_else(|| self.policy.default_first_match_only())
    }
}

/// External tetrahedralizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TetgenConfig {
    pub executable: PathBuf,

    /// Quality, PLC, medit output, no faces file, second-order elements
    pub flags: Vec<String>,

    pub timeout_secs: u64,

    /// Where surfaces and tables are written; a temporary directory when unset
    pub work_dir: Option<PathBuf>,
}

impl Default for TetgenConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tetgen"),
            flags: ["-q", "-p", "-g", "-F", "-o2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 300,
            work_dir: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub material: MaterialConfig,
    pub contact: ContactConfig,
    pub step: StepConfig,

    /// Decimal places kept on node and tagged vertex coordinates
    pub precision: u32,

    pub units: Units,
    pub tagging: TaggingConfig,
    pub tetgen: TetgenConfig,

    /// Object processing order; scene file order when unset
    pub object_order: Option<Vec<String>>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            material: MaterialConfig::default(),
            contact: ContactConfig::default(),
            step: StepConfig::default(),
            precision: 2,
            units: Units::default(),
            tagging: TaggingConfig::default(),
            tetgen: TetgenConfig::default(),
            object_order: None,
        }
    }
}

impl DeckConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TetDeckError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: DeckConfig = serde_json::from_str(&content).map_err(|e| {
            TetDeckError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            TetDeckError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content).map_err(|e| {
            TetDeckError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Reject values the solver or the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TetDeckError::ConfigError(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )))
            }
        };

        positive("material.youngs_modulus", self.material.youngs_modulus)?;
        positive("material.density", self.material.density)?;
        positive("step.initial_increment", self.step.initial_increment)?;
        positive("step.period", self.step.period)?;

        let nu = self.material.poissons_ratio;
        if !(nu > -1.0 && nu < 0.5) {
            return Err(TetDeckError::ConfigError(format!(
                "material.poissons_ratio must lie in (-1, 0.5), got {}",
                nu
            )));
        }

        let friction = self.contact.friction_coefficient;
        if !friction.is_finite() || friction < 0.0 {
            return Err(TetDeckError::ConfigError(format!(
                "contact.friction_coefficient must be non-negative, got {}",
                friction
            )));
        }
        if let Some(k) = self.contact.penalty_stiffness {
            positive("contact.penalty_stiffness", k)?;
        }
        if let Some(s) = self.contact.stick_slope {
            positive("contact.stick_slope", s)?;
        }
        if !self.contact.overclosure_tension.is_finite() {
            return Err(TetDeckError::ConfigError(
                "contact.overclosure_tension must be finite".to_string(),
            ));
        }

        if !self.step.gravity.is_finite() {
            return Err(TetDeckError::ConfigError(
                "step.gravity must be finite".to_string(),
            ));
        }
        let direction = self.step.gravity_direction;
        if direction.iter().any(|c| !c.is_finite()) || direction.iter().all(|&c| c == 0.0) {
            return Err(TetDeckError::ConfigError(
                "step.gravity_direction must be a finite, non-zero vector".to_string(),
            ));
        }

        if self.precision > 9 {
            return Err(TetDeckError::ConfigError(format!(
                "precision must be at most 9 decimals, got {}",
                self.precision
            )));
        }
        if self.tetgen.timeout_secs == 0 {
            return Err(TetDeckError::ConfigError(
                "tetgen.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
