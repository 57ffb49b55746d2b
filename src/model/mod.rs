//! The OIFITS entities: wavelength tables, targets, arrays (with their
//! stations) and the three kinds of measurement.

mod measurement;

pub use measurement::{
    mask, ClosurePhase, Measurement, MeasurementKind, Refs, SquaredVisibility, Visibility,
};

use thiserror::Error;

use crate::{angle::Angle, constants::EARTH_RADIUS};

/// A handle to a [`WavelengthTable`] owned by a [`crate::Dataset`] (an index
/// into its instrument map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WavelengthId(pub usize);

/// A handle to a [`Target`] owned by a [`crate::Dataset`]. The `TARGET_ID`
/// written to file is this index plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

/// A handle to an [`ArrayDescriptor`] owned by a [`crate::Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayId(pub usize);

/// A handle to a [`Station`] within a particular [`ArrayDescriptor`]. It has
/// no meaning without the array it indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(pub usize);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("EFF_WAVE has {num_wave} elements but EFF_BAND has {num_band}")]
    WavelengthLength { num_wave: usize, num_band: usize },
}

/// The spectral channels of one instrument (`OI_WAVELENGTH`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WavelengthTable {
    /// Effective wavelength of each channel \[metres\].
    pub eff_wave: Vec<f64>,

    /// Effective bandpass of each channel \[metres\].
    pub eff_band: Vec<f64>,
}

impl WavelengthTable {
    pub fn new(eff_wave: Vec<f64>, eff_band: Vec<f64>) -> Result<WavelengthTable, ModelError> {
        if eff_wave.len() != eff_band.len() {
            return Err(ModelError::WavelengthLength {
                num_wave: eff_wave.len(),
                num_band: eff_band.len(),
            });
        }
        Ok(WavelengthTable { eff_wave, eff_band })
    }

    /// A table with zero bandpass for every channel.
    pub fn without_bandwidth(eff_wave: Vec<f64>) -> WavelengthTable {
        let eff_band = vec![0.0; eff_wave.len()];
        WavelengthTable { eff_wave, eff_band }
    }

    pub fn num_channels(&self) -> usize {
        self.eff_wave.len()
    }

    pub fn is_well_formed(&self) -> bool {
        self.eff_wave.len() == self.eff_band.len()
    }

    pub fn min_wave(&self) -> Option<f64> {
        self.eff_wave.iter().copied().reduce(f64::min)
    }

    pub fn max_wave(&self) -> Option<f64> {
        self.eff_wave.iter().copied().reduce(f64::max)
    }
}

/// One row of `OI_TARGET`.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,

    /// Right ascension at the equinox.
    pub ra: Angle,

    /// Declination at the equinox.
    pub dec: Angle,

    /// \[years\]
    pub equinox: f64,

    /// \[degrees\]
    pub ra_err: f64,

    /// \[degrees\]
    pub dec_err: f64,

    /// Systemic radial velocity \[m/s\].
    pub sysvel: f64,

    /// Reference frame of `sysvel`, e.g. "LSR", "HELIOCEN", "TOPCENT".
    pub veltyp: String,

    /// "RADIO" or "OPTICAL".
    pub veldef: String,

    /// Proper motions and their errors \[degrees/year\].
    pub pmra: f64,
    pub pmdec: f64,
    pub pmra_err: f64,
    pub pmdec_err: f64,

    /// \[degrees\]
    pub parallax: f64,
    pub para_err: f64,

    pub spectyp: String,
}

impl Target {
    /// A target at the given position with every other attribute at its
    /// conventional default.
    pub fn new<S: Into<String>>(name: S, ra: Angle, dec: Angle) -> Target {
        Target {
            name: name.into(),
            ra,
            dec,
            equinox: 2000.0,
            ra_err: 0.0,
            dec_err: 0.0,
            sysvel: 0.0,
            veltyp: "TOPCENT".to_string(),
            veldef: "OPTICAL".to_string(),
            pmra: 0.0,
            pmdec: 0.0,
            pmra_err: 0.0,
            pmdec_err: 0.0,
            parallax: 0.0,
            para_err: 0.0,
            spectyp: "UNKNOWN".to_string(),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {} ({})",
            self.name,
            self.ra.as_hms(),
            self.dec.as_dms(),
            self.equinox
        )
    }
}

/// A single telescope (one row of `OI_ARRAY`).
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub tel_name: String,
    pub sta_name: String,

    /// \[metres\]
    pub diameter: f64,

    /// Position relative to the owning array's centre \[metres\].
    pub staxyz: [f64; 3],
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({} m)", self.sta_name, self.tel_name, self.diameter)
    }
}

/// An interferometric array (`OI_ARRAY`) and its stations.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDescriptor {
    /// Coordinate frame of `arrxyz`, usually "GEOCENTRIC".
    pub frame: String,

    /// Array centre, geocentric \[metres\].
    pub arrxyz: [f64; 3],

    /// The stations in table order. A [`StationId`] indexes into this.
    pub stations: Vec<Station>,
}

impl ArrayDescriptor {
    pub fn new<S: Into<String>>(frame: S, arrxyz: [f64; 3]) -> ArrayDescriptor {
        ArrayDescriptor {
            frame: frame.into(),
            arrxyz,
            stations: vec![],
        }
    }

    pub fn add_station(&mut self, station: Station) -> StationId {
        self.stations.push(station);
        StationId(self.stations.len() - 1)
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.0)
    }

    pub fn station_by_name(&self, sta_name: &str) -> Option<StationId> {
        self.stations
            .iter()
            .position(|s| s.sta_name == sta_name)
            .map(StationId)
    }

    fn radius(&self) -> f64 {
        let [x, y, z] = self.arrxyz;
        (x * x + y * y + z * z).sqrt()
    }

    /// Latitude of the array centre, assuming a spherical Earth.
    pub fn latitude(&self) -> Angle {
        Angle::from_radians((self.arrxyz[2] / self.radius()).asin())
    }

    /// Longitude of the array centre, assuming a spherical Earth.
    pub fn longitude(&self) -> Angle {
        Angle::from_radians(self.arrxyz[1].atan2(self.arrxyz[0]))
    }

    /// Height of the array centre above a spherical Earth \[metres\].
    pub fn altitude(&self) -> f64 {
        self.radius() - EARTH_RADIUS
    }
}

impl std::fmt::Display for ArrayDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n = self.stations.len();
        write!(
            f,
            "{} {} {} m, {n} station{}",
            self.latitude().as_dms(),
            self.longitude().as_dms(),
            self.altitude(),
            if n == 1 { "" } else { "s" }
        )
    }
}
