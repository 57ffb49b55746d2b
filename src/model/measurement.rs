//! Visibility, squared-visibility and closure-phase measurements.
//!
//! Every measurement refers to the entities it was observed with through
//! handles into its owning [`crate::Dataset`] (see [`Refs`]). The per-channel
//! quantities are stored raw alongside a flag mask; the `masked_*` accessors
//! combine the two.

use hifitime::Epoch;

use super::{ArrayId, StationId, TargetId, WavelengthId};
use crate::constants::{OI_T3, OI_VIS, OI_VIS2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    Visibility,
    SquaredVisibility,
    ClosurePhase,
}

impl MeasurementKind {
    /// The name of the table that holds this kind of measurement.
    pub fn extname(self) -> &'static str {
        match self {
            MeasurementKind::Visibility => OI_VIS,
            MeasurementKind::SquaredVisibility => OI_VIS2,
            MeasurementKind::ClosurePhase => OI_T3,
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MeasurementKind::Visibility => "visibility",
            MeasurementKind::SquaredVisibility => "squared visibility",
            MeasurementKind::ClosurePhase => "closure phase",
        };
        write!(f, "{s}")
    }
}

/// The cross references of a measurement with `N` stations (2 for a baseline,
/// 3 for a triangle).
#[derive(Debug, Clone, PartialEq)]
pub struct Refs<const N: usize> {
    pub wavelength: WavelengthId,
    pub target: TargetId,
    pub array: Option<ArrayId>,

    /// Either every station is known or none are. These index into `array`'s
    /// stations.
    pub stations: Option<[StationId; N]>,
}

impl<const N: usize> Refs<N> {
    /// References without an array (and therefore without stations).
    pub fn new(wavelength: WavelengthId, target: TargetId) -> Refs<N> {
        Refs {
            wavelength,
            target,
            array: None,
            stations: None,
        }
    }

    pub fn with_array(mut self, array: ArrayId, stations: [StationId; N]) -> Refs<N> {
        self.array = Some(array);
        self.stations = Some(stations);
        self
    }
}

/// Behaviour common to all measurement kinds.
pub trait Measurement<const N: usize>: Clone + PartialEq + std::fmt::Debug {
    const KIND: MeasurementKind;

    fn refs(&self) -> &Refs<N>;

    fn refs_mut(&mut self) -> &mut Refs<N>;

    fn time(&self) -> Option<Epoch>;

    /// \[seconds\]
    fn int_time(&self) -> f64;

    fn flag(&self) -> &[bool];

    /// The name and length of every channel-indexed array, the flag mask
    /// included. Each must equal the channel count of the referenced
    /// wavelength table.
    fn channel_lengths(&self) -> Vec<(&'static str, usize)>;

    /// Whether `other` holds the same data, ignoring the timestamp. Flags must
    /// match, but the values of flagged channels are not compared, and NaN
    /// (the floating-point null) equals NaN.
    fn same_data(&self, other: &Self) -> bool;

    fn num_flagged(&self) -> usize {
        self.flag().iter().filter(|&&f| f).count()
    }
}

/// Combine raw per-channel values with a flag mask. Flagged channels (and
/// channels without a flag) come back as `None`.
pub fn mask(values: &[f64], flag: &[bool]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| match flag.get(i) {
            Some(false) => Some(v),
            _ => None,
        })
        .collect()
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Compare two channel arrays on the channels `flag` leaves unflagged.
fn same_channels(a: &[f64], b: &[f64], flag: &[bool]) -> bool {
    a.len() == b.len()
        && mask(a, flag)
            .into_iter()
            .zip(mask(b, flag))
            .all(|pair| match pair {
                (Some(x), Some(y)) => same_value(x, y),
                (None, None) => true,
                _ => false,
            })
}

fn same_optional_channels(a: Option<&[f64]>, b: Option<&[f64]>, flag: &[bool]) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_channels(a, b, flag),
        (None, None) => true,
        _ => false,
    }
}

/// Visibility amplitudes and differential phases on one baseline (`OI_VIS`).
#[derive(Debug, Clone, PartialEq)]
pub struct Visibility {
    /// Absent if no observation time could be recovered.
    pub time: Option<Epoch>,

    /// \[seconds\]
    pub int_time: f64,

    pub visamp: Vec<f64>,
    pub visamperr: Vec<f64>,

    /// \[degrees\]
    pub visphi: Vec<f64>,
    pub visphierr: Vec<f64>,

    /// Correlated flux, when the file provides it.
    pub cflux: Option<Vec<f64>>,
    pub cfluxerr: Option<Vec<f64>>,

    /// `true` marks a channel as invalid.
    pub flag: Vec<bool>,

    /// \[metres\]
    pub ucoord: f64,
    pub vcoord: f64,

    pub refs: Refs<2>,
}

impl Visibility {
    pub fn masked_visamp(&self) -> Vec<Option<f64>> {
        mask(&self.visamp, &self.flag)
    }

    pub fn masked_visamperr(&self) -> Vec<Option<f64>> {
        mask(&self.visamperr, &self.flag)
    }

    pub fn masked_visphi(&self) -> Vec<Option<f64>> {
        mask(&self.visphi, &self.flag)
    }

    pub fn masked_visphierr(&self) -> Vec<Option<f64>> {
        mask(&self.visphierr, &self.flag)
    }

    pub fn masked_cflux(&self) -> Option<Vec<Option<f64>>> {
        self.cflux.as_ref().map(|c| mask(c, &self.flag))
    }

    pub fn masked_cfluxerr(&self) -> Option<Vec<Option<f64>>> {
        self.cfluxerr.as_ref().map(|c| mask(c, &self.flag))
    }

    /// Projected baseline length \[metres\].
    pub fn baseline(&self) -> f64 {
        self.ucoord.hypot(self.vcoord)
    }
}

impl Measurement<2> for Visibility {
    const KIND: MeasurementKind = MeasurementKind::Visibility;

    fn refs(&self) -> &Refs<2> {
        &self.refs
    }

    fn refs_mut(&mut self) -> &mut Refs<2> {
        &mut self.refs
    }

    fn time(&self) -> Option<Epoch> {
        self.time
    }

    fn int_time(&self) -> f64 {
        self.int_time
    }

    fn flag(&self) -> &[bool] {
        &self.flag
    }

    fn channel_lengths(&self) -> Vec<(&'static str, usize)> {
        let mut lengths = vec![
            ("VISAMP", self.visamp.len()),
            ("VISAMPERR", self.visamperr.len()),
            ("VISPHI", self.visphi.len()),
            ("VISPHIERR", self.visphierr.len()),
            ("FLAG", self.flag.len()),
        ];
        if let Some(cflux) = &self.cflux {
            lengths.push(("CFLUX", cflux.len()));
        }
        if let Some(cfluxerr) = &self.cfluxerr {
            lengths.push(("CFLUXERR", cfluxerr.len()));
        }
        lengths
    }

    fn same_data(&self, other: &Self) -> bool {
        let flag = &self.flag;
        self.refs == other.refs
            && *flag == other.flag
            && same_value(self.int_time, other.int_time)
            && same_value(self.ucoord, other.ucoord)
            && same_value(self.vcoord, other.vcoord)
            && same_channels(&self.visamp, &other.visamp, flag)
            && same_channels(&self.visamperr, &other.visamperr, flag)
            && same_channels(&self.visphi, &other.visphi, flag)
            && same_channels(&self.visphierr, &other.visphierr, flag)
            && same_optional_channels(self.cflux.as_deref(), other.cflux.as_deref(), flag)
            && same_optional_channels(self.cfluxerr.as_deref(), other.cfluxerr.as_deref(), flag)
    }
}

/// Squared visibilities on one baseline (`OI_VIS2`).
#[derive(Debug, Clone, PartialEq)]
pub struct SquaredVisibility {
    pub time: Option<Epoch>,
    pub int_time: f64,
    pub vis2data: Vec<f64>,
    pub vis2err: Vec<f64>,
    pub flag: Vec<bool>,
    pub ucoord: f64,
    pub vcoord: f64,
    pub refs: Refs<2>,
}

impl SquaredVisibility {
    pub fn masked_vis2data(&self) -> Vec<Option<f64>> {
        mask(&self.vis2data, &self.flag)
    }

    pub fn masked_vis2err(&self) -> Vec<Option<f64>> {
        mask(&self.vis2err, &self.flag)
    }

    /// Projected baseline length \[metres\].
    pub fn baseline(&self) -> f64 {
        self.ucoord.hypot(self.vcoord)
    }
}

impl Measurement<2> for SquaredVisibility {
    const KIND: MeasurementKind = MeasurementKind::SquaredVisibility;

    fn refs(&self) -> &Refs<2> {
        &self.refs
    }

    fn refs_mut(&mut self) -> &mut Refs<2> {
        &mut self.refs
    }

    fn time(&self) -> Option<Epoch> {
        self.time
    }

    fn int_time(&self) -> f64 {
        self.int_time
    }

    fn flag(&self) -> &[bool] {
        &self.flag
    }

    fn channel_lengths(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("VIS2DATA", self.vis2data.len()),
            ("VIS2ERR", self.vis2err.len()),
            ("FLAG", self.flag.len()),
        ]
    }

    fn same_data(&self, other: &Self) -> bool {
        let flag = &self.flag;
        self.refs == other.refs
            && *flag == other.flag
            && same_value(self.int_time, other.int_time)
            && same_value(self.ucoord, other.ucoord)
            && same_value(self.vcoord, other.vcoord)
            && same_channels(&self.vis2data, &other.vis2data, flag)
            && same_channels(&self.vis2err, &other.vis2err, flag)
    }
}

/// Triple products and closure phases on a station triangle (`OI_T3`).
///
/// Only two of the triangle's (u, v) pairs are stored; the third closes the
/// triangle and is their negated sum.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosurePhase {
    pub time: Option<Epoch>,
    pub int_time: f64,
    pub t3amp: Vec<f64>,
    pub t3amperr: Vec<f64>,

    /// \[degrees\]
    pub t3phi: Vec<f64>,
    pub t3phierr: Vec<f64>,
    pub flag: Vec<bool>,

    /// \[metres\]
    pub u1coord: f64,
    pub v1coord: f64,
    pub u2coord: f64,
    pub v2coord: f64,

    pub refs: Refs<3>,
}

impl ClosurePhase {
    pub fn masked_t3amp(&self) -> Vec<Option<f64>> {
        mask(&self.t3amp, &self.flag)
    }

    pub fn masked_t3amperr(&self) -> Vec<Option<f64>> {
        mask(&self.t3amperr, &self.flag)
    }

    pub fn masked_t3phi(&self) -> Vec<Option<f64>> {
        mask(&self.t3phi, &self.flag)
    }

    pub fn masked_t3phierr(&self) -> Vec<Option<f64>> {
        mask(&self.t3phierr, &self.flag)
    }

    pub fn u3coord(&self) -> f64 {
        -(self.u1coord + self.u2coord)
    }

    pub fn v3coord(&self) -> f64 {
        -(self.v1coord + self.v2coord)
    }
}

impl Measurement<3> for ClosurePhase {
    const KIND: MeasurementKind = MeasurementKind::ClosurePhase;

    fn refs(&self) -> &Refs<3> {
        &self.refs
    }

    fn refs_mut(&mut self) -> &mut Refs<3> {
        &mut self.refs
    }

    fn time(&self) -> Option<Epoch> {
        self.time
    }

    fn int_time(&self) -> f64 {
        self.int_time
    }

    fn flag(&self) -> &[bool] {
        &self.flag
    }

    fn channel_lengths(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("T3AMP", self.t3amp.len()),
            ("T3AMPERR", self.t3amperr.len()),
            ("T3PHI", self.t3phi.len()),
            ("T3PHIERR", self.t3phierr.len()),
            ("FLAG", self.flag.len()),
        ]
    }

    fn same_data(&self, other: &Self) -> bool {
        let flag = &self.flag;
        self.refs == other.refs
            && *flag == other.flag
            && same_value(self.int_time, other.int_time)
            && [
                (self.u1coord, other.u1coord),
                (self.v1coord, other.v1coord),
                (self.u2coord, other.u2coord),
                (self.v2coord, other.v2coord),
            ]
            .into_iter()
            .all(|(a, b)| same_value(a, b))
            && same_channels(&self.t3amp, &other.t3amp, flag)
            && same_channels(&self.t3amperr, &other.t3amperr, flag)
            && same_channels(&self.t3phi, &other.t3phi, flag)
            && same_channels(&self.t3phierr, &other.t3phierr, flag)
    }
}
