// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Shattered Pellet Injection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Shattered pellet injection settings (`eqsys/spi`).
//!
//! Holds the SPI model flags and the initial shard data. Shard radii are
//! drawn from the statistical shard size distribution of Parks (2016),
//! positions from a single shattering point and velocities uniformly over
//! a cone whose axis points along -x.
//!
//! Shard arrays are flat: `vp` and `xp` store (x, y, z) for every shard.

use crate::dict::field;
use crate::ions::{IonGrids, IonSpecies, Ions};
use dream_math::interp::{interp, linspace};
use dream_math::quadrature::cumulative_trapezoid;
use dream_math::special::bessel_k0;
use dream_types::constants::{pellet_material, N_A};
use dream_types::error::{DreamError, DreamResult};
use dream_types::options::{
    IonType, SpiAblationMode, SpiCloudRadiusMode, SpiDepositionMode, SpiHeatAbsorptionMode,
    SpiVelocityMode,
};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::f64::consts::PI;
use tracing::{debug, info};

const MODULE: &str = "spi";

/// Number of points used to tabulate the shard size CDF.
const CDF_POINTS: usize = 5000;

/// Molar fraction assigned to shards that do not contain a species.
/// The solver does not accept exact zeros here.
const ABSENT_MOLAR_FRACTION: f64 = 1e-10;

/// Density used for pellet ion species before ablation starts.
const PELLET_ION_SEED_DENSITY: f64 = 1.0;

/// One species of a (possibly mixed) pellet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PelletComponent {
    /// Name of the ion species created for this component.
    pub name: String,
    pub z: usize,
    pub isotope: i64,
    pub molar_fraction: f64,
}

impl PelletComponent {
    pub fn new(name: &str, z: usize, isotope: i64, molar_fraction: f64) -> Self {
        PelletComponent {
            name: name.to_string(),
            z,
            isotope,
            molar_fraction,
        }
    }
}

/// Uniform shard velocity distribution over a cone around -x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShardVelocityCone {
    /// Mean shard speed (m/s).
    pub abs_vp_mean: f64,
    /// Half width of the uniform speed distribution (m/s).
    pub abs_vp_diff: f64,
    /// Divergence angle span, i.e. twice the opening angle (rad).
    pub alpha_max: f64,
    /// Number of dimensions the shards spread into (1, 2 or 3).
    pub n_dim: usize,
}

/// Full description of one pellet injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PelletInjection {
    pub n_shard: usize,
    /// Number of particles (atoms) in the pellet.
    pub n_inj: f64,
    pub components: Vec<PelletComponent>,
    pub shatter_point: [f64; 3],
    pub velocity: ShardVelocityCone,
}

/// Initial shard data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardData {
    pub rp: Vec<f64>,
    pub vp: Vec<f64>,
    pub xp: Vec<f64>,
    /// Delay before each shard starts moving (s). Empty means no delay.
    #[serde(default)]
    pub t_delay: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiSettings {
    pub velocity: SpiVelocityMode,
    pub ablation: SpiAblationMode,
    pub deposition: SpiDepositionMode,
    #[serde(rename = "heatAbsorbtion")]
    pub heat_absorption: SpiHeatAbsorptionMode,
    #[serde(rename = "cloudRadiusMode")]
    pub cloud_radius_mode: SpiCloudRadiusMode,
    #[serde(rename = "VpVolNormFactor")]
    pub vp_vol_norm_factor: f64,
    #[serde(rename = "rclPrescribedConstant")]
    pub rcl_prescribed_constant: f64,
    pub init: ShardData,
}

impl Default for SpiSettings {
    fn default() -> Self {
        SpiSettings {
            velocity: SpiVelocityMode::None,
            ablation: SpiAblationMode::Neglect,
            deposition: SpiDepositionMode::Neglect,
            heat_absorption: SpiHeatAbsorptionMode::Neglect,
            cloud_radius_mode: SpiCloudRadiusMode::Neglect,
            vp_vol_norm_factor: 1.0,
            rcl_prescribed_constant: 0.01,
            init: ShardData::default(),
        }
    }
}

/// Statistical shard size distribution, `K0(rp kp) kp^2 rp`.
pub fn rp_distribution_parks_statistical(rp: f64, kp: f64) -> f64 {
    bessel_k0(rp * kp) * kp * kp * rp
}

/// Draw `n` shard radii from the statistical distribution by inverse
/// transform sampling of the tabulated CDF.
pub fn sample_rp_distribution_parks_statistical<R: Rng + ?Sized>(
    n: usize,
    kp: f64,
    rng: &mut R,
) -> DreamResult<Vec<f64>> {
    if !(kp.is_finite() && kp > 0.0) {
        return Err(DreamError::equation(
            MODULE,
            format!("Invalid inverse characteristic shard size: {kp}."),
        ));
    }

    let rp_grid = linspace(1e-10 / kp, 10.0 / kp, CDF_POINTS);
    let pdf: Vec<f64> = rp_grid
        .iter()
        .map(|&rp| rp_distribution_parks_statistical(rp, kp))
        .collect();

    let mut cdf = Vec::with_capacity(CDF_POINTS);
    cdf.push(0.0);
    cdf.extend(cumulative_trapezoid(&pdf, &rp_grid)?);

    let unit = Uniform::new(0.0, 1.0);
    Ok((0..n)
        .map(|_| interp(unit.sample(rng), &cdf, &rp_grid))
        .collect())
}

/// Number of particles in a solid sphere of radius `rp`.
fn particles_in_shard(rp: f64, molar_volume: f64) -> f64 {
    4.0 * PI * rp.powi(3) / (3.0 * molar_volume) * N_A
}

fn check_cone_dimension(n_dim: usize) -> DreamResult<()> {
    if !(1..=3).contains(&n_dim) {
        return Err(DreamError::equation(
            MODULE,
            "Invalid number of dimensions into which the pellet shards are spread",
        ));
    }
    Ok(())
}

impl SpiSettings {
    pub fn n_shard(&self) -> usize {
        self.init.rp.len()
    }

    pub fn set_initial_data(&mut self, rp: Vec<f64>, vp: Vec<f64>, xp: Vec<f64>) {
        self.init.rp = rp;
        self.init.vp = vp;
        self.init.xp = xp;
        self.init.t_delay.clear();
    }

    pub fn set_shard_delays(&mut self, t_delay: Vec<f64>) {
        self.init.t_delay = t_delay;
    }

    /// Sample `n_shard` shard radii for a pellet of `n_inj` particles and
    /// connect one dynamic neutral ion species per pellet component.
    ///
    /// Returns the inverse characteristic shard size `kp`.
    pub fn set_rp_parks_statistical<R: Rng + ?Sized>(
        &mut self,
        n_shard: usize,
        n_inj: f64,
        components: &[PelletComponent],
        ions: &mut Ions,
        add: bool,
        rng: &mut R,
    ) -> DreamResult<f64> {
        if n_shard == 0 {
            return Err(DreamError::equation(MODULE, "The number of shards must be positive."));
        }
        if !(n_inj.is_finite() && n_inj > 0.0) {
            return Err(DreamError::equation(
                MODULE,
                format!("Invalid number of injected particles: {n_inj}."),
            ));
        }
        if components.is_empty() {
            return Err(DreamError::equation(MODULE, "The pellet has no components."));
        }

        let mut molar_volume = 0.0;
        for c in components {
            let material = pellet_material(c.z as i64, c.isotope).ok_or_else(|| {
                DreamError::equation(
                    MODULE,
                    format!(
                        "No solid-state data available for pellet component '{}' (Z = {}, isotope = {}).",
                        c.name, c.z, c.isotope
                    ),
                )
            })?;
            molar_volume += c.molar_fraction * material.molar_mass / material.solid_density;
        }
        if molar_volume.is_nan() || molar_volume <= 0.0 {
            return Err(DreamError::equation(
                MODULE,
                "The molar fractions of the pellet components must be positive.",
            ));
        }
        for (i, c) in components.iter().enumerate() {
            ions.check_new_name(&c.name)?;
            if components[..i].iter().any(|o| o.name == c.name) {
                return Err(DreamError::equation(
                    MODULE,
                    format!("Pellet component '{}' is listed more than once.", c.name),
                ));
            }
        }
        let solid_particle_density = N_A / molar_volume;

        let kp = (6.0 * PI * PI * solid_particle_density * n_shard as f64 / n_inj).cbrt();

        let mut rp_init = sample_rp_distribution_parks_statistical(n_shard, kp, rng)?;
        let n_obtained: f64 = rp_init
            .iter()
            .map(|&rp| particles_in_shard(rp, molar_volume))
            .sum();
        let scale = (n_inj / n_obtained).cbrt();
        rp_init.iter_mut().for_each(|rp| *rp *= scale);

        debug!(kp, n_shard, scale, "sampled shard radii");

        let previous = if add { self.init.rp.len() } else { 0 };
        let new_species = components
            .iter()
            .map(|c| {
                let mut fraction = vec![ABSENT_MOLAR_FRACTION; previous];
                fraction.extend(std::iter::repeat(c.molar_fraction).take(n_shard));
                Ok(IonSpecies::new(
                    &c.name,
                    c.z,
                    c.isotope,
                    IonType::DynamicNeutral,
                    PELLET_ION_SEED_DENSITY,
                    &IonGrids::default(),
                )?
                .with_spi_molar_fraction(fraction))
            })
            .collect::<DreamResult<Vec<_>>>()?;

        if add {
            self.init.rp.extend(rp_init);
            if !self.init.t_delay.is_empty() {
                self.init.t_delay.extend(std::iter::repeat(0.0).take(n_shard));
            }
        } else {
            self.init.rp = rp_init;
            self.init.t_delay.clear();
        }

        // Earlier pellets contribute nothing to the new shards
        for ion in ions.ions_mut() {
            if let Some(f) = ion.spi_molar_fraction() {
                let mut f = if add { f.to_vec() } else { Vec::new() };
                f.extend(std::iter::repeat(0.0).take(n_shard));
                ion.set_spi_molar_fraction(Some(f));
            }
        }

        for species in new_species {
            ions.add_ion(species)?;
        }

        info!(
            kp,
            n_shard,
            total_shards = self.init.rp.len(),
            "pellet shard sizes set"
        );
        Ok(kp)
    }

    /// Place `n_shard` shards at `shatter_point`.
    pub fn set_shard_positions_single_point(
        &mut self,
        n_shard: usize,
        shatter_point: [f64; 3],
        add: bool,
    ) {
        if !add {
            self.init.xp.clear();
        }
        for _ in 0..n_shard {
            self.init.xp.extend_from_slice(&shatter_point);
        }
    }

    /// Draw `n_shard` shard velocities uniformly over `cone`.
    pub fn set_shard_velocities_uniform<R: Rng + ?Sized>(
        &mut self,
        n_shard: usize,
        cone: &ShardVelocityCone,
        add: bool,
        rng: &mut R,
    ) -> DreamResult<()> {
        check_cone_dimension(cone.n_dim)?;

        let unit = Uniform::new(0.0, 1.0);
        let mut vp_init = Vec::with_capacity(3 * n_shard);
        for _ in 0..n_shard {
            let speed = cone.abs_vp_mean + cone.abs_vp_diff * (2.0 * unit.sample(rng) - 1.0);
            let v = match cone.n_dim {
                1 => [-speed, 0.0, 0.0],
                2 => {
                    let alpha = cone.alpha_max * (2.0 * unit.sample(rng) - 1.0);
                    [-speed * alpha.cos(), speed * alpha.sin(), 0.0]
                }
                _ => {
                    // Solid angle between alpha and alpha + dalpha is proportional to sin(alpha)
                    let alpha = (unit.sample(rng) * (1.0 - (cone.alpha_max / 2.0).cos())).asin();
                    let phi = 2.0 * PI * unit.sample(rng);
                    [
                        -speed * alpha.cos(),
                        speed * alpha.sin() * phi.cos(),
                        speed * alpha.sin() * phi.sin(),
                    ]
                }
            };
            vp_init.extend_from_slice(&v);
        }

        if add {
            self.init.vp.extend(vp_init);
        } else {
            self.init.vp = vp_init;
        }
        Ok(())
    }

    /// Radii, positions and velocities for one pellet, following the
    /// set-up of Vallhagen's MSc thesis. Returns `kp`.
    pub fn set_params_vallhagen_msc<R: Rng + ?Sized>(
        &mut self,
        pellet: &PelletInjection,
        ions: &mut Ions,
        add: bool,
        rng: &mut R,
    ) -> DreamResult<f64> {
        check_cone_dimension(pellet.velocity.n_dim)?;
        let kp = self.set_rp_parks_statistical(
            pellet.n_shard,
            pellet.n_inj,
            &pellet.components,
            ions,
            add,
            rng,
        )?;
        self.set_shard_positions_single_point(pellet.n_shard, pellet.shatter_point, add);
        self.set_shard_velocities_uniform(pellet.n_shard, &pellet.velocity, add, rng)?;
        Ok(kp)
    }

    pub fn set_vp_vol_norm_factor(&mut self, factor: f64) {
        self.vp_vol_norm_factor = factor;
    }

    pub fn set_rcl_prescribed_constant(&mut self, rcl: f64) {
        self.rcl_prescribed_constant = rcl;
    }

    pub fn set_velocity(&mut self, velocity: SpiVelocityMode) {
        self.velocity = velocity;
    }

    pub fn set_ablation(&mut self, ablation: SpiAblationMode) {
        self.ablation = ablation;
    }

    pub fn set_deposition(&mut self, deposition: SpiDepositionMode) {
        self.deposition = deposition;
    }

    pub fn set_heat_absorption(&mut self, heat_absorption: SpiHeatAbsorptionMode) {
        self.heat_absorption = heat_absorption;
    }

    pub fn set_cloud_radius_mode(&mut self, mode: SpiCloudRadiusMode) {
        self.cloud_radius_mode = mode;
    }

    pub fn to_dict(&self) -> DreamResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        Ok(SpiSettings {
            velocity: field(data, "velocity", MODULE)?,
            ablation: field(data, "ablation", MODULE)?,
            deposition: field(data, "deposition", MODULE)?,
            heat_absorption: field(data, "heatAbsorbtion", MODULE)?,
            cloud_radius_mode: field(data, "cloudRadiusMode", MODULE)?,
            vp_vol_norm_factor: field(data, "VpVolNormFactor", MODULE)?,
            rcl_prescribed_constant: field(data, "rclPrescribedConstant", MODULE)?,
            init: field(data, "init", MODULE)?,
        })
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        let n = self.init.rp.len();
        if self.init.vp.len() != 3 * n {
            return Err(DreamError::equation(
                MODULE,
                "Missmatch in size of initial data arrays for rp and vp. Expected vp to have a size 3 times the size of rp",
            ));
        }
        if self.init.xp.len() != 3 * n {
            return Err(DreamError::equation(
                MODULE,
                "Missmatch in size of initial data arrays for rp and xp. Expected xp to have a size 3 times the size of rp",
            ));
        }
        if !self.init.t_delay.is_empty() && self.init.t_delay.len() != n {
            return Err(DreamError::equation(
                MODULE,
                format!(
                    "Invalid number of shard delays: {}. Expected {n}.",
                    self.init.t_delay.len()
                ),
            ));
        }
        if self.init.rp.iter().any(|rp| !rp.is_finite() || *rp < 0.0) {
            return Err(DreamError::equation(MODULE, "Shard radii must be non-negative."));
        }
        if !(self.vp_vol_norm_factor.is_finite() && self.vp_vol_norm_factor > 0.0) {
            return Err(DreamError::equation(
                MODULE,
                "Invalid value assigned to 'VpVolNormFactor'. Must be positive.",
            ));
        }
        if self.cloud_radius_mode == SpiCloudRadiusMode::PrescribedConstant
            && !(self.rcl_prescribed_constant > 0.0)
        {
            return Err(DreamError::equation(
                MODULE,
                "Invalid value assigned to 'rclPrescribedConstant'. Must be positive.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deuterium() -> Vec<PelletComponent> {
        vec![PelletComponent::new("D_inj", 1, 2, 1.0)]
    }

    #[test]
    fn test_distribution_normalised() {
        let kp = 250.0;
        let r = linspace(1e-10 / kp, 20.0 / kp, 20000);
        let f: Vec<f64> = r.iter().map(|&x| rp_distribution_parks_statistical(x, kp)).collect();
        let total = dream_math::quadrature::trapezoid(&f, &r).unwrap();
        assert!((total - 1.0).abs() < 1e-3, "∫f = {total}");
    }

    #[test]
    fn test_sampled_mean_matches_distribution() {
        // E[rp] = π / (2 kp)
        let kp = 100.0;
        let mut rng = StdRng::seed_from_u64(42);
        let rp = sample_rp_distribution_parks_statistical(20_000, kp, &mut rng).unwrap();
        let mean = rp.iter().sum::<f64>() / rp.len() as f64;
        let expected = PI / (2.0 * kp);
        assert!(
            (mean - expected).abs() / expected < 0.05,
            "mean = {mean}, expected {expected}"
        );
        assert!(rp.iter().all(|&r| r > 0.0 && r <= 10.0 / kp));
    }

    #[test]
    fn test_invalid_kp_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_rp_distribution_parks_statistical(10, 0.0, &mut rng).is_err());
        assert!(sample_rp_distribution_parks_statistical(10, f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn test_particle_count_is_exact_after_rescaling() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(42);
        let n_inj = 1.8e24;
        let kp = spi
            .set_rp_parks_statistical(200, n_inj, &deuterium(), &mut ions, true, &mut rng)
            .unwrap();

        let material = pellet_material(1, 2).unwrap();
        let molar_volume = material.molar_mass / material.solid_density;
        let expected_kp = (6.0 * PI * PI * (N_A / molar_volume) * 200.0 / n_inj).cbrt();
        assert!((kp - expected_kp).abs() / expected_kp < 1e-12);

        let total: f64 = spi
            .init
            .rp
            .iter()
            .map(|&rp| particles_in_shard(rp, molar_volume))
            .sum();
        assert!((total - n_inj).abs() / n_inj < 1e-9, "N = {total}");
        assert_eq!(spi.n_shard(), 200);
    }

    #[test]
    fn test_pellet_ions_are_connected() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mixed = vec![
            PelletComponent::new("D_inj", 1, 2, 0.95),
            PelletComponent::new("Ne_inj", 10, 0, 0.05),
        ];
        spi.set_rp_parks_statistical(4, 1e24, &mixed, &mut ions, true, &mut rng)
            .unwrap();

        assert_eq!(ions.len(), 2);
        let ne = ions.get_species("Ne_inj").unwrap();
        assert_eq!(ne.ion_type(), IonType::Dynamic);
        assert_eq!(ne.spi_molar_fraction().unwrap(), &[0.05; 4]);
        assert_eq!(ne.density()[[0, 0]], 1.0);
    }

    #[test]
    fn test_second_pellet_extends_molar_fractions() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(3);
        spi.set_rp_parks_statistical(3, 1e24, &deuterium(), &mut ions, true, &mut rng)
            .unwrap();
        let neon = vec![PelletComponent::new("Ne_inj", 10, 0, 1.0)];
        spi.set_rp_parks_statistical(2, 1e23, &neon, &mut ions, true, &mut rng)
            .unwrap();

        assert_eq!(spi.n_shard(), 5);
        let d = ions.get_species("D_inj").unwrap();
        assert_eq!(d.spi_molar_fraction().unwrap(), &[1.0, 1.0, 1.0, 0.0, 0.0]);
        let ne = ions.get_species("Ne_inj").unwrap();
        assert_eq!(
            ne.spi_molar_fraction().unwrap(),
            &[1e-10, 1e-10, 1e-10, 1.0, 1.0]
        );
        assert!(ions.verify_settings().is_ok());
    }

    #[test]
    fn test_replacing_shards_resets_previous_fractions() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(3);
        spi.set_rp_parks_statistical(3, 1e24, &deuterium(), &mut ions, true, &mut rng)
            .unwrap();
        let neon = vec![PelletComponent::new("Ne_inj", 10, 0, 1.0)];
        spi.set_rp_parks_statistical(2, 1e23, &neon, &mut ions, false, &mut rng)
            .unwrap();

        assert_eq!(spi.n_shard(), 2);
        let d = ions.get_species("D_inj").unwrap();
        assert_eq!(d.spi_molar_fraction().unwrap(), &[0.0, 0.0]);
        let ne = ions.get_species("Ne_inj").unwrap();
        assert_eq!(ne.spi_molar_fraction().unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn test_unknown_material_rejected() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(3);
        let argon = vec![PelletComponent::new("Ar_inj", 18, 0, 1.0)];
        let e = spi
            .set_rp_parks_statistical(3, 1e24, &argon, &mut ions, true, &mut rng)
            .unwrap_err();
        assert!(e.to_string().contains("Ar_inj"));
        assert!(ions.is_empty());
        assert_eq!(spi.n_shard(), 0);
    }

    #[test]
    fn test_single_point_positions() {
        let mut spi = SpiSettings::default();
        spi.set_shard_positions_single_point(2, [2.0, 0.0, 0.1], false);
        assert_eq!(spi.init.xp, vec![2.0, 0.0, 0.1, 2.0, 0.0, 0.1]);
        spi.set_shard_positions_single_point(1, [1.0, 1.0, 1.0], true);
        assert_eq!(spi.init.xp.len(), 9);
        spi.set_shard_positions_single_point(1, [1.0, 1.0, 1.0], false);
        assert_eq!(spi.init.xp, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_velocities_1d_along_minus_x() {
        let mut spi = SpiSettings::default();
        let mut rng = StdRng::seed_from_u64(11);
        let cone = ShardVelocityCone {
            abs_vp_mean: 200.0,
            abs_vp_diff: 20.0,
            alpha_max: 0.5,
            n_dim: 1,
        };
        spi.set_shard_velocities_uniform(50, &cone, false, &mut rng)
            .unwrap();
        for v in spi.init.vp.chunks(3) {
            assert!(v[0] <= -180.0 && v[0] >= -220.0, "vx = {}", v[0]);
            assert_eq!(v[1], 0.0);
            assert_eq!(v[2], 0.0);
        }
    }

    #[test]
    fn test_velocities_2d_within_arc() {
        let mut spi = SpiSettings::default();
        let mut rng = StdRng::seed_from_u64(12);
        let cone = ShardVelocityCone {
            abs_vp_mean: 100.0,
            abs_vp_diff: 0.0,
            alpha_max: 0.3,
            n_dim: 2,
        };
        spi.set_shard_velocities_uniform(100, &cone, false, &mut rng)
            .unwrap();
        for v in spi.init.vp.chunks(3) {
            let speed = (v[0] * v[0] + v[1] * v[1]).sqrt();
            assert!((speed - 100.0).abs() < 1e-9);
            assert!(v[1].atan2(-v[0]).abs() <= 0.3 + 1e-12);
            assert_eq!(v[2], 0.0);
        }
    }

    #[test]
    fn test_velocities_3d_within_cone() {
        let mut spi = SpiSettings::default();
        let mut rng = StdRng::seed_from_u64(13);
        let alpha_max = 0.4;
        let cone = ShardVelocityCone {
            abs_vp_mean: 150.0,
            abs_vp_diff: 10.0,
            alpha_max,
            n_dim: 3,
        };
        spi.set_shard_velocities_uniform(100, &cone, false, &mut rng)
            .unwrap();
        let max_alpha = (1.0 - (alpha_max / 2.0).cos()).asin();
        for v in spi.init.vp.chunks(3) {
            let speed = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((140.0..=160.0).contains(&speed));
            let alpha = (-v[0] / speed).acos();
            assert!(alpha <= max_alpha + 1e-9);
        }
    }

    #[test]
    fn test_invalid_dimension() {
        let mut spi = SpiSettings::default();
        let mut rng = StdRng::seed_from_u64(1);
        let cone = ShardVelocityCone {
            abs_vp_mean: 100.0,
            abs_vp_diff: 0.0,
            alpha_max: 0.3,
            n_dim: 4,
        };
        assert!(spi
            .set_shard_velocities_uniform(1, &cone, false, &mut rng)
            .is_err());
    }

    #[test]
    fn test_vallhagen_setup_is_consistent() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(5);
        let pellet = PelletInjection {
            n_shard: 10,
            n_inj: 1.8e24,
            components: deuterium(),
            shatter_point: [2.0, 0.0, 0.0],
            velocity: ShardVelocityCone {
                abs_vp_mean: 200.0,
                abs_vp_diff: 40.0,
                alpha_max: 0.35,
                n_dim: 2,
            },
        };
        let kp = spi
            .set_params_vallhagen_msc(&pellet, &mut ions, true, &mut rng)
            .unwrap();
        assert!(kp > 0.0);
        assert!(spi.verify_settings().is_ok());
        assert_eq!(spi.init.vp.len(), 30);
    }

    #[test]
    fn test_same_seed_same_shards() {
        let sample = |seed| {
            let mut spi = SpiSettings::default();
            let mut ions = Ions::default();
            let mut rng = StdRng::seed_from_u64(seed);
            spi.set_rp_parks_statistical(8, 1e24, &deuterium(), &mut ions, true, &mut rng)
                .unwrap();
            spi.init.rp
        };
        assert_eq!(sample(99), sample(99));
        assert_ne!(sample(99), sample(100));
    }

    #[test]
    fn test_dict_keys_and_roundtrip() {
        let mut spi = SpiSettings::default();
        spi.set_ablation(SpiAblationMode::FluidNgs);
        spi.set_deposition(SpiDepositionMode::LocalGaussian);
        spi.set_heat_absorption(SpiHeatAbsorptionMode::LocalFluidNgs);
        spi.set_initial_data(vec![1e-3], vec![-200.0, 0.0, 0.0], vec![2.0, 0.0, 0.0]);
        spi.set_shard_delays(vec![1e-4]);

        let data = spi.to_dict().unwrap();
        assert_eq!(data["ablation"], serde_json::json!(2));
        assert_eq!(data["deposition"], serde_json::json!(4));
        assert_eq!(data["heatAbsorbtion"], serde_json::json!(2));
        assert_eq!(data["VpVolNormFactor"], serde_json::json!(1.0));
        assert_eq!(data["init"]["t_delay"], serde_json::json!([1e-4]));

        let loaded = SpiSettings::from_dict(&data).unwrap();
        assert_eq!(loaded, spi);
    }

    #[test]
    fn test_from_dict_without_delays() {
        let data = serde_json::json!({
            "velocity": 2,
            "ablation": 3,
            "deposition": 1,
            "heatAbsorbtion": 1,
            "cloudRadiusMode": 2,
            "VpVolNormFactor": 1.0,
            "rclPrescribedConstant": 0.01,
            "init": { "rp": [], "vp": [], "xp": [] },
        });
        let spi = SpiSettings::from_dict(&data).unwrap();
        assert_eq!(spi.velocity, SpiVelocityMode::Prescribed);
        assert!(spi.init.t_delay.is_empty());
        assert!(spi.verify_settings().is_ok());
    }

    #[test]
    fn test_verify_detects_size_mismatch() {
        let mut spi = SpiSettings::default();
        spi.set_initial_data(vec![1e-3, 2e-3], vec![0.0; 6], vec![0.0; 3]);
        let e = spi.verify_settings().unwrap_err();
        assert!(e.to_string().contains("xp"));

        spi.set_initial_data(vec![1e-3], vec![0.0; 3], vec![0.0; 3]);
        spi.set_shard_delays(vec![0.0, 0.0]);
        assert!(spi.verify_settings().is_err());

        spi.set_shard_delays(Vec::new());
        spi.set_initial_data(vec![-1e-3], vec![0.0; 3], vec![0.0; 3]);
        let e = spi.verify_settings().unwrap_err();
        assert!(e.to_string().contains("non-negative"));

        spi.set_initial_data(vec![f64::NAN], vec![0.0; 3], vec![0.0; 3]);
        assert!(spi.verify_settings().is_err());
        spi.set_initial_data(vec![f64::INFINITY], vec![0.0; 3], vec![0.0; 3]);
        assert!(spi.verify_settings().is_err());

        spi.set_initial_data(vec![0.0], vec![0.0; 3], vec![0.0; 3]);
        assert!(spi.verify_settings().is_ok());
    }

    #[test]
    fn test_invalid_ion_name_leaves_state_untouched() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(21);
        spi.set_rp_parks_statistical(3, 1e24, &deuterium(), &mut ions, true, &mut rng)
            .unwrap();
        let rp_before = spi.init.rp.clone();
        let ions_before = ions.clone();

        for name in ["Ne;x", ""] {
            let bad = vec![PelletComponent::new(name, 10, 0, 1.0)];
            let e = spi
                .set_rp_parks_statistical(2, 1e23, &bad, &mut ions, true, &mut rng)
                .unwrap_err();
            assert!(e.to_string().contains("Invalid ion name"));
            assert_eq!(spi.init.rp, rp_before);
            assert_eq!(ions, ions_before);
        }
        assert!(spi.verify_settings().is_ok());
    }

    #[test]
    fn test_repeated_component_rejected() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(22);
        let twice = vec![
            PelletComponent::new("D_inj", 1, 2, 0.5),
            PelletComponent::new("D_inj", 1, 2, 0.5),
        ];
        assert!(spi
            .set_rp_parks_statistical(2, 1e23, &twice, &mut ions, true, &mut rng)
            .is_err());
        assert!(ions.is_empty());
        assert_eq!(spi.n_shard(), 0);
    }

    #[test]
    fn test_invalid_cone_leaves_state_untouched() {
        let mut spi = SpiSettings::default();
        let mut ions = Ions::default();
        let mut rng = StdRng::seed_from_u64(23);
        let pellet = PelletInjection {
            n_shard: 4,
            n_inj: 1e24,
            components: deuterium(),
            shatter_point: [2.0, 0.0, 0.0],
            velocity: ShardVelocityCone {
                abs_vp_mean: 200.0,
                abs_vp_diff: 0.0,
                alpha_max: 0.3,
                n_dim: 4,
            },
        };
        let e = spi
            .set_params_vallhagen_msc(&pellet, &mut ions, true, &mut rng)
            .unwrap_err();
        assert!(e.to_string().contains("number of dimensions"));
        assert_eq!(spi, SpiSettings::default());
        assert!(ions.is_empty());
    }
}
