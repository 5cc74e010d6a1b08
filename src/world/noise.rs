//! Fractal noise sampling and domain warping built on FastNoiseLite
//!
//! Every sampler here is a pure function of its parameters: the same
//! coordinates and `NoiseParams` always produce the same value.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters for one noise channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub seed: i32,
    pub octaves: u32,
    pub offset: IVec2,
    /// Coordinate scale applied before the first octave.
    pub magnitude: f32,
    pub persistence: f32,
    pub modifier: f32,
    pub plateau_exponent: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            offset: IVec2::ZERO,
            magnitude: 0.01,
            persistence: 0.5,
            modifier: 1.0,
            plateau_exponent: 1.0,
        }
    }
}

impl NoiseParams {
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = seed;
        self
    }

    /// Folds the world seed into this channel's own seed.
    pub fn reseeded(self, world_seed: i32) -> Self {
        let seed = world_seed.wrapping_add(self.seed);
        self.with_seed(seed)
    }

    pub fn validate(&self, channel: &str) -> Result<()> {
        if self.octaves == 0 {
            return Err(Error::InvalidConfig(format!(
                "{channel}: octaves must be at least 1"
            )));
        }
        if !(self.persistence > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "{channel}: persistence must be positive, got {}",
                self.persistence
            )));
        }
        if !(self.modifier >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "{channel}: modifier must be non-negative, got {}",
                self.modifier
            )));
        }
        if !self.magnitude.is_finite() || !self.plateau_exponent.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "{channel}: magnitude and plateau_exponent must be finite"
            )));
        }
        Ok(())
    }
}

/// Multi-octave 2D Perlin sampler normalised to `[0, 1]`.
pub struct NoiseField {
    params: NoiseParams,
    noise: FastNoiseLite,
}

impl NoiseField {
    pub fn new(params: NoiseParams) -> Self {
        let mut noise = FastNoiseLite::with_seed(params.seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));
        NoiseField { params, noise }
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Sums `octaves` layers, doubling frequency and scaling amplitude by
    /// `persistence` each layer, normalised by the total amplitude.
    pub fn sample_octaves(&self, x: f32, z: f32) -> f32 {
        let p = &self.params;
        let x = x * p.magnitude + p.magnitude + p.offset.x as f32;
        let z = z * p.magnitude + p.magnitude + p.offset.y as f32;

        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut amplitude_sum = 0.0;

        for _ in 0..p.octaves {
            let sample = self.noise.get_noise_2d(x * frequency, z * frequency);
            total += to_unit(sample) * amplitude;
            amplitude_sum += amplitude;
            amplitude *= p.persistence;
            frequency *= 2.0;
        }

        if amplitude_sum <= 0.0 {
            return 0.0;
        }
        (total / amplitude_sum).clamp(0.0, 1.0)
    }

    /// Octave sample passed through this channel's redistribution curve.
    pub fn sample_redistributed(&self, x: f32, z: f32) -> f32 {
        redistribute(
            self.sample_octaves(x, z),
            self.params.modifier,
            self.params.plateau_exponent,
        )
    }
}

impl Clone for NoiseField {
    fn clone(&self) -> Self {
        NoiseField::new(self.params)
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("params", &self.params)
            .finish()
    }
}

fn to_unit(sample: f32) -> f32 {
    ((sample + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// `pow(value * modifier, exponent)`. Both inputs must be non-negative.
pub fn redistribute(value: f32, modifier: f32, exponent: f32) -> f32 {
    debug_assert!(value >= 0.0 && modifier >= 0.0, "negative redistribute base");
    (value * modifier).powf(exponent)
}

/// Linear map of `[0, 1]` onto `[min, max]`, truncated toward zero.
pub fn remap_to_range(value: f32, min: i32, max: i32) -> i32 {
    (min as f32 + value * (max - min) as f32) as i32
}

/// Offsets sample coordinates by two auxiliary noise channels before
/// sampling a target field.
#[derive(Clone, Debug)]
pub struct DomainWarp {
    x_noise: NoiseField,
    z_noise: NoiseField,
    amplitude_x: f32,
    amplitude_z: f32,
}

impl DomainWarp {
    pub fn new(x_params: NoiseParams, z_params: NoiseParams, amplitude_x: f32, amplitude_z: f32) -> Self {
        DomainWarp {
            x_noise: NoiseField::new(x_params),
            z_noise: NoiseField::new(z_params),
            amplitude_x,
            amplitude_z,
        }
    }

    /// A warp that leaves coordinates untouched.
    pub fn identity() -> Self {
        Self::new(NoiseParams::default(), NoiseParams::default(), 0.0, 0.0)
    }

    pub fn offset(&self, x: f32, z: f32) -> Vec2 {
        Vec2::new(
            self.x_noise.sample_octaves(x, z) * self.amplitude_x,
            self.z_noise.sample_octaves(x, z) * self.amplitude_z,
        )
    }

    pub fn int_offset(&self, x: i32, z: i32) -> IVec2 {
        self.offset(x as f32, z as f32).round().as_ivec2()
    }

    pub fn warp(&self, x: f32, z: f32, target: &NoiseField) -> f32 {
        let offset = self.offset(x, z);
        target.sample_octaves(x + offset.x, z + offset.y)
    }
}

/// Row-major 2D grid of noise samples, indexed `[x][z]`.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseGrid {
    size_x: usize,
    size_z: usize,
    values: Vec<f32>,
}

impl NoiseGrid {
    pub fn from_fn(size_x: usize, size_z: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(size_x * size_z);
        for x in 0..size_x {
            for z in 0..size_z {
                values.push(f(x, z));
            }
        }
        NoiseGrid {
            size_x,
            size_z,
            values,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_z)
    }

    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.values[x * self.size_z + z]
    }
}

/// Cells that are `>=` every existing 8-neighbour, offset by `origin`.
/// Missing neighbours on the border pass trivially and plateaus all qualify.
pub fn local_maxima(grid: &NoiseGrid, origin: IVec2) -> Vec<IVec2> {
    let (size_x, size_z) = grid.size();
    let mut maxima = Vec::new();

    for x in 0..size_x {
        for z in 0..size_z {
            let value = grid.get(x, z);
            let mut is_max = true;

            'neighbours: for dx in -1i32..=1 {
                for dz in -1i32..=1 {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    let nx = x as i32 + dx;
                    let nz = z as i32 + dz;
                    if nx < 0 || nz < 0 || nx >= size_x as i32 || nz >= size_z as i32 {
                        continue;
                    }
                    if grid.get(nx as usize, nz as usize) > value {
                        is_max = false;
                        break 'neighbours;
                    }
                }
            }

            if is_max {
                maxima.push(origin + IVec2::new(x as i32, z as i32));
            }
        }
    }

    maxima
}
