//! Travel-time model: distance to minutes, with seeded noise.
//!
//! The mean leg time is
//!
//! ```text
//! mean_travel(d) = d · detour_factor / (speed_kmh · speed_multiplier) · 60
//! ```
//!
//! minutes, with `d` in kilometres (great-circle) or coordinate units. A
//! sampled leg applies the configured [`Noise`] on top of the mean.

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use rand_distr::LogNormal;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::error::{Result, RoutingError};

/// Speeds below this are treated as this value.
const MIN_SPEED_KMH: f64 = 1e-6;

/// Travel-time perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Noise {
    /// Every leg takes its mean time.
    None,
    /// Multiplicative log-normal factor with mean one (μ = −σ²/2).
    LogNormal {
        /// Standard deviation of the underlying normal.
        sigma: f64,
    },
    /// Additive uniform offset in `[-half_width, half_width]` minutes;
    /// legs never go below zero.
    Uniform {
        /// Half the width of the offset range.
        half_width: f64,
    },
}

impl Default for Noise {
    fn default() -> Self {
        Self::LogNormal { sigma: 0.25 }
    }
}

/// Converts distances into travel minutes.
///
/// # Examples
///
/// ```
/// use u_shuttle::simulation::{Noise, TimeModel};
///
/// let model = TimeModel::default().with_noise(Noise::None);
/// // 3 km · 1.25 / 18 km/h = 12.5 minutes
/// assert!((model.mean_travel(3.0) - 12.5).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeModel {
    /// Base vehicle speed.
    #[serde(default = "default_speed_kmh")]
    pub speed_kmh: f64,
    /// Scenario multiplier on speed (e.g. 0.8 for congestion).
    #[serde(default = "default_one")]
    pub speed_multiplier: f64,
    /// Road distance per straight-line distance.
    #[serde(default = "default_detour_factor")]
    pub detour_factor: f64,
    /// Dwell minutes added after every leg.
    #[serde(default)]
    pub service_time: f64,
    /// Leg perturbation.
    #[serde(default)]
    pub noise: Noise,
}

fn default_speed_kmh() -> f64 {
    18.0
}

fn default_one() -> f64 {
    1.0
}

fn default_detour_factor() -> f64 {
    1.25
}

impl Default for TimeModel {
    fn default() -> Self {
        Self {
            speed_kmh: default_speed_kmh(),
            speed_multiplier: default_one(),
            detour_factor: default_detour_factor(),
            service_time: 0.0,
            noise: Noise::default(),
        }
    }
}

impl TimeModel {
    /// Sets the base speed.
    pub fn with_speed_kmh(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    /// Sets the speed multiplier.
    pub fn with_speed_multiplier(mut self, speed_multiplier: f64) -> Self {
        self.speed_multiplier = speed_multiplier;
        self
    }

    /// Sets the detour factor.
    pub fn with_detour_factor(mut self, detour_factor: f64) -> Self {
        self.detour_factor = detour_factor;
        self
    }

    /// Sets the per-stop service time.
    pub fn with_service_time(mut self, service_time: f64) -> Self {
        self.service_time = service_time;
        self
    }

    /// Sets the noise model.
    pub fn with_noise(mut self, noise: Noise) -> Self {
        self.noise = noise;
        self
    }

    /// Checks that every parameter is finite and in range.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("speed_kmh", self.speed_kmh),
            ("speed_multiplier", self.speed_multiplier),
            ("detour_factor", self.detour_factor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(RoutingError::invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !self.service_time.is_finite() || self.service_time < 0.0 {
            return Err(RoutingError::invalid(format!(
                "service_time must be non-negative, got {}",
                self.service_time
            )));
        }
        match self.noise {
            Noise::None => Ok(()),
            Noise::LogNormal { sigma: w } | Noise::Uniform { half_width: w } => {
                if w.is_finite() && w >= 0.0 {
                    Ok(())
                } else {
                    Err(RoutingError::invalid(format!(
                        "noise width must be non-negative, got {w}"
                    )))
                }
            }
        }
    }

    /// Mean travel minutes for distance `d`, excluding service time.
    pub fn mean_travel(&self, d: f64) -> f64 {
        let speed = (self.speed_kmh * self.speed_multiplier).max(MIN_SPEED_KMH);
        d * self.detour_factor / speed * 60.0
    }

    /// Mean leg duration: travel plus service time.
    pub fn mean_leg(&self, d: f64) -> f64 {
        self.mean_travel(d) + self.service_time
    }

    /// Mean travel-time matrix, in minutes.
    pub fn time_matrix(&self, distances: &DistanceMatrix) -> DistanceMatrix {
        distances.map(|d| self.mean_travel(d))
    }

    /// Builds the leg sampler for this model.
    pub fn sampler(&self) -> Result<LegSampler> {
        self.validate()?;
        let noise = match self.noise {
            Noise::LogNormal { sigma } if sigma > 0.0 => {
                let dist = LogNormal::new(-0.5 * sigma * sigma, sigma)
                    .map_err(|e| RoutingError::invalid(format!("log-normal noise: {e}")))?;
                SampledNoise::LogNormal(dist)
            }
            Noise::Uniform { half_width } if half_width > 0.0 => {
                let dist = Uniform::new_inclusive(-half_width, half_width)
                    .map_err(|e| RoutingError::invalid(format!("uniform noise: {e}")))?;
                SampledNoise::Uniform(dist)
            }
            _ => SampledNoise::Fixed,
        };
        Ok(LegSampler {
            model: self.clone(),
            noise,
        })
    }
}

#[derive(Debug, Clone)]
enum SampledNoise {
    Fixed,
    LogNormal(LogNormal<f64>),
    Uniform(Uniform<f64>),
}

/// Draws perturbed leg durations from a validated [`TimeModel`].
#[derive(Debug, Clone)]
pub struct LegSampler {
    model: TimeModel,
    noise: SampledNoise,
}

impl LegSampler {
    /// The model this sampler draws from.
    pub fn model(&self) -> &TimeModel {
        &self.model
    }

    /// Sampled leg duration for distance `d`: noisy travel plus service time.
    pub fn sample_leg<R: Rng>(&self, d: f64, rng: &mut R) -> f64 {
        let mean = self.model.mean_travel(d);
        let travel = match &self.noise {
            SampledNoise::Fixed => mean,
            SampledNoise::LogNormal(dist) => mean * dist.sample(rng),
            SampledNoise::Uniform(dist) => (mean + dist.sample(rng)).max(0.0),
        };
        travel + self.model.service_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults() {
        let model = TimeModel::default();
        assert_eq!(model.speed_kmh, 18.0);
        assert_eq!(model.detour_factor, 1.25);
        assert_eq!(model.noise, Noise::LogNormal { sigma: 0.25 });
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_mean_travel_with_multiplier() {
        let model = TimeModel::default().with_speed_multiplier(0.5);
        // 1.8 km · 1.25 / 9 km/h · 60 = 15 min
        assert!((model.mean_travel(1.8) - 15.0).abs() < 1e-10);
        assert_eq!(model.mean_travel(0.0), 0.0);
    }

    #[test]
    fn test_service_time_in_leg() {
        let model = TimeModel::default().with_noise(Noise::None).with_service_time(2.0);
        let sampler = model.sampler().expect("valid");
        let mut rng = StdRng::seed_from_u64(1);
        assert!((sampler.sample_leg(3.0, &mut rng) - 14.5).abs() < 1e-10);
        assert!((model.mean_leg(3.0) - 14.5).abs() < 1e-10);
    }

    #[test]
    fn test_zero_sigma_is_deterministic() {
        let model = TimeModel::default().with_noise(Noise::LogNormal { sigma: 0.0 });
        let sampler = model.sampler().expect("valid");
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(sampler.sample_leg(3.0, &mut rng), model.mean_travel(3.0));
    }

    #[test]
    fn test_lognormal_mean_near_one() {
        let model = TimeModel::default();
        let sampler = model.sampler().expect("valid");
        let mut rng = StdRng::seed_from_u64(123);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| sampler.sample_leg(1.0, &mut rng)).sum::<f64>() / n as f64;
        let expected = model.mean_travel(1.0);
        assert!((mean / expected - 1.0).abs() < 0.02, "ratio {}", mean / expected);
    }

    #[test]
    fn test_uniform_noise_clamped() {
        let model = TimeModel::default().with_noise(Noise::Uniform { half_width: 100.0 });
        let sampler = model.sampler().expect("valid");
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let leg = sampler.sample_leg(0.1, &mut rng);
            assert!(leg >= 0.0);
            assert!(leg <= model.mean_travel(0.1) + 100.0 + 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_samples() {
        let sampler = TimeModel::default().sampler().expect("valid");
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..5).map(|_| sampler.sample_leg(2.0, &mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
        assert_ne!(draw(42), draw(43));
    }

    #[test]
    fn test_time_matrix() {
        let dm = DistanceMatrix::from_points(&[Point::new(0.0, 0.0), Point::new(3.0, 0.0)]);
        let tm = TimeModel::default().time_matrix(&dm);
        assert!((tm.get(0, 1) - 12.5).abs() < 1e-10);
        assert_eq!(tm.get(1, 1), 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(TimeModel::default().with_speed_kmh(0.0).validate().is_err());
        assert!(TimeModel::default().with_detour_factor(f64::NAN).validate().is_err());
        assert!(TimeModel::default().with_service_time(-1.0).validate().is_err());
        assert!(TimeModel::default()
            .with_noise(Noise::LogNormal { sigma: -0.1 })
            .sampler()
            .is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let model: TimeModel = serde_json::from_str(r#"{"speed_multiplier": 0.8}"#).expect("valid");
        assert_eq!(model.speed_multiplier, 0.8);
        assert_eq!(model.speed_kmh, 18.0);
        assert_eq!(model.noise, Noise::LogNormal { sigma: 0.25 });
    }
}
