//! Cross-reference integrity and shape checks on a [`Dataset`].

use log::{error, warn};
use thiserror::Error;

use super::Dataset;
use crate::{
    constants::{NAME_WIDTH, VEL_WIDTH},
    model::{Measurement, MeasurementKind},
};

/// The kind of reference that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefCategory {
    Array,
    Station,
    Wavelength,
    Target,
}

impl std::fmt::Display for RefCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RefCategory::Array => "array",
            RefCategory::Station => "station",
            RefCategory::Wavelength => "wavelength",
            RefCategory::Target => "target",
        };
        write!(f, "{s}")
    }
}

/// A measurement refers to an entity that its dataset doesn't own.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} measurement {index} has a {category} reference that isn't part of this dataset")]
pub struct ConsistencyError {
    pub kind: MeasurementKind,

    /// The position of the measurement within its sequence.
    pub index: usize,

    pub category: RefCategory,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error(transparent)]
    Inconsistent(#[from] ConsistencyError),

    #[error("No targets")]
    NoTargets,

    #[error("No wavelength tables")]
    NoWavelengths,

    #[error("Wavelength table '{insname}' has {num_wave} EFF_WAVE but {num_band} EFF_BAND elements")]
    WavelengthLength {
        insname: String,
        num_wave: usize,
        num_band: usize,
    },

    #[error("Wavelength table '{insname}' has no channels")]
    EmptyWavelength { insname: String },

    #[error("No measurements")]
    NoMeasurements,

    #[error("{kind} measurement {index}: {quantity} has {len} elements but wavelength table '{insname}' has {expected} channels")]
    ChannelMismatch {
        kind: MeasurementKind,
        index: usize,
        quantity: &'static str,
        len: usize,
        expected: usize,
        insname: String,
    },

    #[error("{field} '{value}' is longer than {max} bytes and will be truncated on write")]
    NameTooLong {
        field: &'static str,
        value: String,
        max: usize,
    },

    #[error("{kind} measurement {index} has every channel flagged")]
    AllFlagged { kind: MeasurementKind, index: usize },
}

/// The outcome of [`Dataset::validate`]. Every problem found is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, issue: ValidationIssue) {
        error!("{issue}");
        self.errors.push(issue);
    }

    fn warn(&mut self, issue: ValidationIssue) {
        warn!("{issue}");
        self.warnings.push(issue);
    }
}

impl Dataset {
    /// Check that every reference held by every measurement resolves to an
    /// entity owned by this dataset. The first failure is returned.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        self.check_refs(&self.vis)?;
        self.check_refs(&self.vis2)?;
        self.check_refs(&self.t3)?;
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.check_consistency().is_ok()
    }

    fn check_refs<const N: usize, M: Measurement<N>>(
        &self,
        measurements: &[M],
    ) -> Result<(), ConsistencyError> {
        for (index, m) in measurements.iter().enumerate() {
            let fail = |category| ConsistencyError {
                kind: M::KIND,
                index,
                category,
            };
            let refs = m.refs();

            let array = match refs.array {
                Some(id) => Some(self.array(id).ok_or_else(|| fail(RefCategory::Array))?),
                None => None,
            };
            if let Some(stations) = refs.stations {
                let array = array.ok_or_else(|| fail(RefCategory::Station))?;
                if stations.iter().any(|&s| array.station(s).is_none()) {
                    return Err(fail(RefCategory::Station));
                }
            }
            if self.wavelength(refs.wavelength).is_none() {
                return Err(fail(RefCategory::Wavelength));
            }
            if self.target(refs.target).is_none() {
                return Err(fail(RefCategory::Target));
            }
        }
        Ok(())
    }

    /// Check everything needed for this dataset to make a sensible OIFITS
    /// file. Problems are accumulated (and logged) rather than returned one
    /// at a time.
    pub fn validate(&self) -> Validation {
        let mut v = Validation::default();

        if let Err(e) = self.check_consistency() {
            v.error(e.into());
        }
        if self.targets.is_empty() {
            v.error(ValidationIssue::NoTargets);
        }
        if self.wavelengths.is_empty() {
            v.error(ValidationIssue::NoWavelengths);
        }
        for (insname, table) in &self.wavelengths {
            if !table.is_well_formed() {
                v.error(ValidationIssue::WavelengthLength {
                    insname: insname.clone(),
                    num_wave: table.eff_wave.len(),
                    num_band: table.eff_band.len(),
                });
            } else if table.num_channels() == 0 {
                v.error(ValidationIssue::EmptyWavelength {
                    insname: insname.clone(),
                });
            }
        }
        if self.num_measurements() == 0 {
            v.error(ValidationIssue::NoMeasurements);
        }
        self.validate_channels(&self.vis, &mut v);
        self.validate_channels(&self.vis2, &mut v);
        self.validate_channels(&self.t3, &mut v);

        for t in &self.targets {
            check_width(&mut v, "TARGET", &t.name, NAME_WIDTH);
            check_width(&mut v, "VELTYP", &t.veltyp, VEL_WIDTH);
            check_width(&mut v, "VELDEF", &t.veldef, VEL_WIDTH);
            check_width(&mut v, "SPECTYP", &t.spectyp, NAME_WIDTH);
        }
        for a in self.arrays.values() {
            for s in &a.stations {
                check_width(&mut v, "TEL_NAME", &s.tel_name, NAME_WIDTH);
                check_width(&mut v, "STA_NAME", &s.sta_name, NAME_WIDTH);
            }
        }

        v
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    fn validate_channels<const N: usize, M: Measurement<N>>(
        &self,
        measurements: &[M],
        v: &mut Validation,
    ) {
        for (index, m) in measurements.iter().enumerate() {
            let wavelength_id = m.refs().wavelength;
            // Dangling handles have already been reported.
            let (insname, table) = match (
                self.insname(wavelength_id),
                self.wavelength(wavelength_id),
            ) {
                (Some(i), Some(t)) => (i, t),
                _ => continue,
            };
            let expected = table.num_channels();
            for (quantity, len) in m.channel_lengths() {
                if len != expected {
                    v.error(ValidationIssue::ChannelMismatch {
                        kind: M::KIND,
                        index,
                        quantity,
                        len,
                        expected,
                        insname: insname.to_string(),
                    });
                }
            }
            if !m.flag().is_empty() && m.num_flagged() == m.flag().len() {
                v.warn(ValidationIssue::AllFlagged {
                    kind: M::KIND,
                    index,
                });
            }
        }
    }
}

fn check_width(v: &mut Validation, field: &'static str, value: &str, max: usize) {
    if value.len() > max {
        v.warn(ValidationIssue::NameTooLong {
            field,
            value: value.to_string(),
            max,
        });
    }
}
