//! Combining two datasets into one.
//!
//! Entities of the second dataset are matched against those already in the
//! result (by value, or by name if configured). Entities without a match are
//! adopted. Every handle held by the second dataset's measurements is then
//! translated into a handle of the result.

#[cfg(test)]
mod tests;

use log::{debug, trace, warn};
use thiserror::Error;

use crate::{dataset::ConsistencyError, model::*, Dataset};

/// How measurements of the second dataset are recognised as duplicates of
/// measurements already in the result (duplicates are not added again).
///
/// Either way, measurements are compared on their unflagged values only:
/// flags must agree, but whatever a flagged channel holds is ignored. NaN
/// equals NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Every field must be equal, timestamp included.
    #[default]
    ExactValue,

    /// Measurements that differ only by their timestamps are duplicates.
    IgnoreTime,
}

/// Options for [`combine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeConfig {
    /// Treat targets with the same name as the same target, regardless of
    /// their other attributes.
    pub match_target_by_name: bool,

    /// Treat stations (within an array of the same name) with the same
    /// station name as the same station, regardless of their other
    /// attributes.
    pub match_station_by_name: bool,

    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Base,
    Other,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Base => write!(f, "base"),
            Side::Other => write!(f, "other"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Refusing to merge: the {side} dataset is inconsistent: {source}")]
    Inconsistent {
        side: Side,
        source: ConsistencyError,
    },

    #[error("Both datasets have a wavelength table named '{insname}', but the tables differ")]
    WavelengthConflict { insname: String },

    #[error("Array '{arrname}' has differing stations named '{sta_name}' in the two datasets")]
    StationConflict { arrname: String, sta_name: String },

    /// A handle could not be translated. This is a bug, not a property of the
    /// inputs.
    #[error("Couldn't translate the {what} reference of a measurement; this is a bug")]
    Unresolved { what: &'static str },
}

/// Translations from the handles of the second dataset to handles of the
/// result, indexed by the second dataset's handle.
#[derive(Debug, Default)]
struct HandleMaps {
    wavelengths: Vec<WavelengthId>,
    targets: Vec<TargetId>,
    arrays: Vec<ArrayId>,
    /// Per array of the second dataset.
    stations: Vec<Vec<StationId>>,
}

/// Combine `base` and `other` into a new dataset. Both inputs must be
/// consistent. Neither input is modified.
pub fn combine(
    base: &Dataset,
    other: &Dataset,
    config: &MergeConfig,
) -> Result<Dataset, MergeError> {
    base.check_consistency()
        .map_err(|source| MergeError::Inconsistent {
            side: Side::Base,
            source,
        })?;
    other
        .check_consistency()
        .map_err(|source| MergeError::Inconsistent {
            side: Side::Other,
            source,
        })?;

    let mut result = base.clone();
    let maps = HandleMaps {
        wavelengths: merge_wavelengths(&mut result, other)?,
        targets: merge_targets(&mut result, other, config),
        ..Default::default()
    };
    let maps = merge_arrays(&mut result, other, config, maps)?;

    let num_before = result.num_measurements();
    merge_measurements(&mut result.vis, &other.vis, &maps, config.duplicates)?;
    merge_measurements(&mut result.vis2, &other.vis2, &maps, config.duplicates)?;
    merge_measurements(&mut result.t3, &other.t3, &maps, config.duplicates)?;
    debug!(
        "Merged {} of {} measurements",
        result.num_measurements() - num_before,
        other.num_measurements()
    );

    Ok(result)
}

fn merge_wavelengths(
    result: &mut Dataset,
    other: &Dataset,
) -> Result<Vec<WavelengthId>, MergeError> {
    let mut map = Vec::with_capacity(other.wavelengths.len());
    for (insname, table) in &other.wavelengths {
        let id = match result.wavelengths.get_full(insname) {
            Some((index, _, existing)) => {
                if existing != table {
                    return Err(MergeError::WavelengthConflict {
                        insname: insname.clone(),
                    });
                }
                WavelengthId(index)
            }
            None => {
                trace!("Adopting wavelength table '{insname}'");
                result.add_wavelength(insname.clone(), table.clone())
            }
        };
        map.push(id);
    }
    Ok(map)
}

fn merge_targets(result: &mut Dataset, other: &Dataset, config: &MergeConfig) -> Vec<TargetId> {
    let mut map = Vec::with_capacity(other.targets.len());
    for target in &other.targets {
        let matched = if config.match_target_by_name {
            result.targets.iter().position(|t| t.name == target.name)
        } else {
            result.targets.iter().position(|t| t == target)
        };
        let id = match matched {
            Some(index) => TargetId(index),
            None => {
                if result.targets.iter().any(|t| t.name == target.name) {
                    warn!(
                        "Target '{}' appears in both datasets with different attributes; keeping both",
                        target.name
                    );
                }
                trace!("Adopting target '{}'", target.name);
                result.add_target(target.clone())
            }
        };
        map.push(id);
    }
    map
}

fn merge_arrays(
    result: &mut Dataset,
    other: &Dataset,
    config: &MergeConfig,
    mut maps: HandleMaps,
) -> Result<HandleMaps, MergeError> {
    for (arrname, other_array) in &other.arrays {
        let index = match result.arrays.get_index_of(arrname) {
            Some(index) => index,
            None => {
                trace!("Adopting array '{arrname}'");
                let id = result.add_array(arrname.clone(), other_array.clone());
                maps.arrays.push(id);
                maps.stations
                    .push((0..other_array.stations.len()).map(StationId).collect());
                continue;
            }
        };
        let result_array = &mut result.arrays[index];
        if result_array.frame != other_array.frame {
            warn!(
                "Array '{arrname}' has frame '{}' in one dataset and '{}' in the other; keeping '{}'",
                result_array.frame, other_array.frame, result_array.frame
            );
        }

        let mut station_map = Vec::with_capacity(other_array.stations.len());
        for station in &other_array.stations {
            let mut matched = result_array.stations.iter().position(|s| s == station);
            if matched.is_none() && config.match_station_by_name {
                matched = result_array.station_by_name(&station.sta_name).map(|s| s.0);
            }
            let id = match matched {
                Some(s) => StationId(s),
                None => {
                    if result_array.station_by_name(&station.sta_name).is_some() {
                        return Err(MergeError::StationConflict {
                            arrname: arrname.clone(),
                            sta_name: station.sta_name.clone(),
                        });
                    }
                    let mut relocated = station.clone();
                    for ((xyz, &other_centre), &result_centre) in relocated
                        .staxyz
                        .iter_mut()
                        .zip(other_array.arrxyz.iter())
                        .zip(result_array.arrxyz.iter())
                    {
                        *xyz = *xyz - other_centre + result_centre;
                    }
                    trace!("Adopting station '{}' into array '{arrname}'", station.sta_name);
                    result_array.add_station(relocated)
                }
            };
            station_map.push(id);
        }
        maps.arrays.push(ArrayId(index));
        maps.stations.push(station_map);
    }
    Ok(maps)
}

fn merge_measurements<const N: usize, M: Measurement<N>>(
    result: &mut Vec<M>,
    other: &[M],
    maps: &HandleMaps,
    policy: DuplicatePolicy,
) -> Result<(), MergeError> {
    for m in other {
        let m = translate(m, maps)?;
        if is_duplicate(result, &m, policy) {
            trace!("Skipping duplicate {} measurement", M::KIND);
            continue;
        }
        result.push(m);
    }
    Ok(())
}

/// Copy a measurement, rewriting its handles into the result's.
fn translate<const N: usize, M: Measurement<N>>(m: &M, maps: &HandleMaps) -> Result<M, MergeError> {
    let mut m = m.clone();
    let refs = m.refs_mut();

    refs.wavelength = *maps
        .wavelengths
        .get(refs.wavelength.0)
        .ok_or(MergeError::Unresolved { what: "wavelength" })?;
    refs.target = *maps
        .targets
        .get(refs.target.0)
        .ok_or(MergeError::Unresolved { what: "target" })?;

    if let Some(stations) = refs.stations.as_mut() {
        let station_map = refs
            .array
            .and_then(|a| maps.stations.get(a.0))
            .ok_or(MergeError::Unresolved { what: "station" })?;
        for s in stations.iter_mut() {
            *s = *station_map
                .get(s.0)
                .ok_or(MergeError::Unresolved { what: "station" })?;
        }
    }
    if let Some(array) = refs.array.as_mut() {
        *array = *maps
            .arrays
            .get(array.0)
            .ok_or(MergeError::Unresolved { what: "array" })?;
    }

    Ok(m)
}

fn is_duplicate<const N: usize, M: Measurement<N>>(
    existing: &[M],
    m: &M,
    policy: DuplicatePolicy,
) -> bool {
    existing.iter().any(|e| {
        let same_time = match policy {
            DuplicatePolicy::ExactValue => e.time() == m.time(),
            DuplicatePolicy::IgnoreTime => true,
        };
        same_time && e.same_data(m)
    })
}
