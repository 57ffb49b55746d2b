//! Building a [`Dataset`] from OIFITS tables.
//!
//! This happens in two passes. The first builds every entity (wavelength
//! tables, targets, arrays and their stations) and remembers the file-local
//! keys used to refer to them (`INSNAME`, `TARGET_ID`, `ARRNAME` and
//! `STA_INDEX`). The second builds measurements, resolving those keys into
//! handles. Anything that doesn't resolve aborts the read.

mod error;
#[cfg(test)]
mod tests;

pub use error::ReadError;

use std::collections::HashMap;

use hifitime::Epoch;
use log::{debug, trace, warn};
use ndarray::prelude::*;

use crate::{
    angle::Angle,
    constants::*,
    model::*,
    table::{ColumnData, Section, TableStore},
    time::{parse_date_obs, row_timestamp},
    Dataset,
};

/// The file-local keys seen in the first pass.
#[derive(Default)]
struct Context {
    targets: HashMap<i64, TargetId>,

    /// `STA_INDEX` to station, per array.
    stations: HashMap<ArrayId, HashMap<i64, StationId>>,
}

/// Read every OIFITS table held by `store` into a new [`Dataset`]. Sections
/// that aren't OIFITS tables are ignored.
pub fn read_dataset(store: &dyn TableStore) -> Result<Dataset, ReadError> {
    let sections = store.sections();
    let mut dataset = Dataset::new();
    let mut context = Context::default();

    for section in sections {
        match section.name.as_str() {
            OI_WAVELENGTH => read_wavelength(section, &mut dataset)?,
            OI_TARGET => read_targets(section, &mut dataset, &mut context)?,
            OI_ARRAY => read_array(section, &mut dataset, &mut context)?,
            OI_VIS | OI_VIS2 | OI_T3 | PRIMARY => (),
            name => debug!("Ignoring section '{name}'"),
        }
    }

    for section in sections {
        match section.name.as_str() {
            OI_VIS => {
                let rows = Rows::new(section, OI_VIS, &dataset, &context)?;
                let vis = read_vis(&rows)?;
                dataset.vis.extend(vis);
            }
            OI_VIS2 => {
                let rows = Rows::new(section, OI_VIS2, &dataset, &context)?;
                let vis2 = read_vis2(&rows)?;
                dataset.vis2.extend(vis2);
            }
            OI_T3 => {
                let rows = Rows::new(section, OI_T3, &dataset, &context)?;
                let t3 = read_t3(&rows)?;
                dataset.t3.extend(t3);
            }
            _ => (),
        }
    }

    debug!(
        "Read {} wavelength tables, {} targets, {} arrays, {} vis, {} vis2, {} t3",
        dataset.wavelengths.len(),
        dataset.targets.len(),
        dataset.arrays.len(),
        dataset.vis.len(),
        dataset.vis2.len(),
        dataset.t3.len()
    );
    Ok(dataset)
}

fn read_wavelength(section: &Section, dataset: &mut Dataset) -> Result<(), ReadError> {
    let insname = section.key_str("INSNAME")?.to_string();
    if dataset.wavelengths.contains_key(&insname) {
        return Err(ReadError::DuplicateName {
            section: OI_WAVELENGTH,
            key: "INSNAME",
            name: insname,
        });
    }
    let eff_wave = section.f64_column("EFF_WAVE")?;
    let eff_band = section.f64_column("EFF_BAND")?;
    let table = WavelengthTable::new(eff_wave, eff_band).map_err(|source| {
        ReadError::Wavelength {
            section: OI_WAVELENGTH,
            insname: insname.clone(),
            source,
        }
    })?;
    trace!("{insname}: {} channels", table.num_channels());
    dataset.add_wavelength(insname, table);
    Ok(())
}

fn read_targets(
    section: &Section,
    dataset: &mut Dataset,
    context: &mut Context,
) -> Result<(), ReadError> {
    check_row_counts(
        section,
        &[
            "TARGET_ID", "RAEP0", "DECEP0", "EQUINOX", "RA_ERR", "DEC_ERR", "SYSVEL", "PMRA",
            "PMDEC", "PMRA_ERR", "PMDEC_ERR", "PARALLAX", "PARA_ERR",
        ],
    )?;
    let target_ids = section.i64_column("TARGET_ID")?;
    let names = section.str_column("TARGET")?;
    let raep0 = section.f64_column("RAEP0")?;
    let decep0 = section.f64_column("DECEP0")?;
    let equinox = section.f64_column("EQUINOX")?;
    let ra_err = section.f64_column("RA_ERR")?;
    let dec_err = section.f64_column("DEC_ERR")?;
    let sysvel = section.f64_column("SYSVEL")?;
    let veltyp = section.str_column("VELTYP")?;
    let veldef = section.str_column("VELDEF")?;
    let pmra = section.f64_column("PMRA")?;
    let pmdec = section.f64_column("PMDEC")?;
    let pmra_err = section.f64_column("PMRA_ERR")?;
    let pmdec_err = section.f64_column("PMDEC_ERR")?;
    let parallax = section.f64_column("PARALLAX")?;
    let para_err = section.f64_column("PARA_ERR")?;
    let spectyp = section.str_column("SPECTYP")?;

    for (i, &target_id) in target_ids.iter().enumerate() {
        let target = Target {
            name: names[i].trim().to_string(),
            ra: Angle(raep0[i]),
            dec: Angle(decep0[i]),
            equinox: equinox[i],
            ra_err: ra_err[i],
            dec_err: dec_err[i],
            sysvel: sysvel[i],
            veltyp: veltyp[i].trim().to_string(),
            veldef: veldef[i].trim().to_string(),
            pmra: pmra[i],
            pmdec: pmdec[i],
            pmra_err: pmra_err[i],
            pmdec_err: pmdec_err[i],
            parallax: parallax[i],
            para_err: para_err[i],
            spectyp: spectyp[i].trim().to_string(),
        };
        if context.targets.contains_key(&target_id) {
            return Err(ReadError::DuplicateTargetId {
                section: OI_TARGET,
                target_id,
            });
        }
        trace!("TARGET_ID {target_id}: {target}");
        let id = dataset.add_target(target);
        context.targets.insert(target_id, id);
    }
    Ok(())
}

fn read_array(
    section: &Section,
    dataset: &mut Dataset,
    context: &mut Context,
) -> Result<(), ReadError> {
    let arrname = section.key_str("ARRNAME")?.to_string();
    if dataset.arrays.contains_key(&arrname) {
        return Err(ReadError::DuplicateName {
            section: OI_ARRAY,
            key: "ARRNAME",
            name: arrname,
        });
    }
    let mut array = ArrayDescriptor::new(
        section.key_str("FRAME")?,
        [
            section.key_f64("ARRAYX")?,
            section.key_f64("ARRAYY")?,
            section.key_f64("ARRAYZ")?,
        ],
    );

    check_row_counts(section, &["STA_INDEX", "DIAMETER"])?;
    let tel_names = section.str_column("TEL_NAME")?;
    let sta_names = section.str_column("STA_NAME")?;
    let sta_indices = section.i64_column("STA_INDEX")?;
    let diameters = section.f64_column("DIAMETER")?;
    let staxyz = section.f64_rows("STAXYZ")?;
    if staxyz.ncols() != 3 {
        return Err(ReadError::WrongType {
            section: OI_ARRAY.to_string(),
            name: "STAXYZ".to_string(),
            expected: "3 elements wide",
        });
    }

    let mut station_map = HashMap::with_capacity(sta_indices.len());
    for (i, &sta_index) in sta_indices.iter().enumerate() {
        let xyz = staxyz.row(i);
        let id = array.add_station(Station {
            tel_name: tel_names[i].trim().to_string(),
            sta_name: sta_names[i].trim().to_string(),
            diameter: diameters[i],
            staxyz: [xyz[0], xyz[1], xyz[2]],
        });
        if station_map.insert(sta_index, id).is_some() {
            return Err(ReadError::DuplicateStationIndex {
                section: OI_ARRAY,
                arrname,
                sta_index,
            });
        }
    }

    debug!("{arrname}: {array}");
    let id = dataset.add_array(arrname, array);
    context.stations.insert(id, station_map);
    Ok(())
}

/// The per-row values common to every measurement table, with references
/// already resolved.
struct Rows<'a> {
    section: &'a Section,
    name: &'static str,
    num_rows: usize,
    wavelength: WavelengthId,
    array: Option<(ArrayId, &'a str, &'a HashMap<i64, StationId>)>,
    times: Vec<Option<Epoch>>,
    int_time: Vec<f64>,
    targets: Vec<TargetId>,
    sta_index: Array2<i64>,
}

impl<'a> Rows<'a> {
    fn new(
        section: &'a Section,
        name: &'static str,
        dataset: &Dataset,
        context: &'a Context,
    ) -> Result<Rows<'a>, ReadError> {
        check_row_counts(
            section,
            &[
                "TARGET_ID", "TIME", "MJD", "INT_TIME", "UCOORD", "VCOORD", "U1COORD", "V1COORD",
                "U2COORD", "V2COORD",
            ],
        )?;
        let num_rows = section.num_rows();

        let insname = section.key_str("INSNAME")?;
        let wavelength =
            dataset
                .wavelength_id(insname)
                .ok_or_else(|| ReadError::UnknownInstrument {
                    section: name,
                    insname: insname.to_string(),
                })?;

        let array = match section.optional_key_str("ARRNAME")?.map(str::trim) {
            None | Some("") => None,
            Some(arrname) => {
                let id = dataset
                    .array_id(arrname)
                    .ok_or_else(|| ReadError::UnknownArray {
                        section: name,
                        arrname: arrname.to_string(),
                    })?;
                let stations =
                    context
                        .stations
                        .get(&id)
                        .ok_or_else(|| ReadError::UnknownArray {
                            section: name,
                            arrname: arrname.to_string(),
                        })?;
                Some((id, arrname, stations))
            }
        };

        let date_obs = match section.optional_key_str("DATE-OBS")? {
            Some(s) => {
                let date_obs = parse_date_obs(s);
                if date_obs.is_none() {
                    warn!("{name}: couldn't parse DATE-OBS '{s}'; using MJD for timestamps");
                }
                date_obs
            }
            None => None,
        };
        let time = optional_f64_column(section, "TIME", num_rows)?;
        let mjd = optional_f64_column(section, "MJD", num_rows)?;
        let times = time
            .into_iter()
            .zip(mjd)
            .map(|(time, mjd)| row_timestamp(date_obs, time, mjd))
            .collect();

        let targets = section
            .i64_column("TARGET_ID")?
            .into_iter()
            .enumerate()
            .map(|(row, target_id)| {
                context
                    .targets
                    .get(&target_id)
                    .copied()
                    .ok_or(ReadError::UnknownTarget {
                        section: name,
                        row,
                        target_id,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rows {
            section,
            name,
            num_rows,
            wavelength,
            array,
            times,
            int_time: section.f64_column("INT_TIME")?,
            targets,
            sta_index: section.i64_rows("STA_INDEX")?,
        })
    }

    /// Per-channel values of a column, one `Vec` per row.
    fn channels(&self, column: &str) -> Result<Vec<Vec<f64>>, ReadError> {
        let rows = self.section.f64_rows(column)?;
        Ok(rows.outer_iter().map(|r| r.to_vec()).collect())
    }

    /// Like `channels`, but an absent column, or a row that's entirely NaN,
    /// gives `None`.
    fn optional_channels(&self, column: &str) -> Result<Vec<Option<Vec<f64>>>, ReadError> {
        if self.section.column(column).is_none() {
            return Ok(vec![None; self.num_rows]);
        }
        Ok(self
            .channels(column)?
            .into_iter()
            .map(|r| {
                if r.iter().all(|v| v.is_nan()) {
                    None
                } else {
                    Some(r)
                }
            })
            .collect())
    }

    fn flags(&self) -> Result<Vec<Vec<bool>>, ReadError> {
        let rows = self.section.bool_rows("FLAG")?;
        Ok(rows.outer_iter().map(|r| r.to_vec()).collect())
    }

    fn refs<const N: usize>(&self, row: usize) -> Result<Refs<N>, ReadError> {
        if self.sta_index.ncols() != N {
            return Err(ReadError::WrongType {
                section: self.name.to_string(),
                name: "STA_INDEX".to_string(),
                expected: if N == 2 { "2 elements wide" } else { "3 elements wide" },
            });
        }
        let mut refs = Refs::new(self.wavelength, self.targets[row]);
        let (array, arrname, station_map) = match self.array {
            Some(a) => a,
            // Station indices mean nothing without an array.
            None => return Ok(refs),
        };
        refs.array = Some(array);

        let indices = self.sta_index.row(row);
        let num_set = indices.iter().filter(|&&i| i > 0).count();
        if num_set == 0 {
            return Ok(refs);
        }
        if num_set != N {
            return Err(ReadError::PartialStations {
                section: self.name,
                row,
            });
        }
        let mut stations = [StationId(0); N];
        for (station, &sta_index) in stations.iter_mut().zip(indices.iter()) {
            *station =
                *station_map
                    .get(&sta_index)
                    .ok_or_else(|| ReadError::UnknownStation {
                        section: self.name,
                        row,
                        arrname: arrname.to_string(),
                        sta_index,
                    })?;
        }
        refs.stations = Some(stations);
        Ok(refs)
    }
}

/// Every column must hold a whole number of rows, and the same number as
/// the others. The `scalars` (where present) must hold one value per row.
fn check_row_counts(section: &Section, scalars: &[&str]) -> Result<(), ReadError> {
    let num_rows = section.num_rows();
    for column in &section.columns {
        let expected = match &column.data {
            ColumnData::Text { .. } => num_rows,
            _ if scalars.contains(&column.name.as_str()) => num_rows,
            _ => num_rows * column.repeat,
        };
        let len = column.data.len();
        if len != expected {
            return Err(ReadError::RowCount {
                section: section.name.clone(),
                column: column.name.clone(),
                len,
                expected,
            });
        }
    }
    Ok(())
}

/// A column of one value per row that may be absent (all NaN).
fn optional_f64_column(
    section: &Section,
    column: &str,
    num_rows: usize,
) -> Result<Vec<f64>, ReadError> {
    match section.column(column) {
        Some(_) => Ok(section.f64_column(column)?),
        None => Ok(vec![f64::NAN; num_rows]),
    }
}

fn read_vis(rows: &Rows) -> Result<Vec<Visibility>, ReadError> {
    let visamp = rows.channels("VISAMP")?;
    let visamperr = rows.channels("VISAMPERR")?;
    let visphi = rows.channels("VISPHI")?;
    let visphierr = rows.channels("VISPHIERR")?;
    let cflux = rows.optional_channels("CFLUX")?;
    let cfluxerr = rows.optional_channels("CFLUXERR")?;
    let flag = rows.flags()?;
    let ucoord = rows.section.f64_column("UCOORD")?;
    let vcoord = rows.section.f64_column("VCOORD")?;

    let mut out = Vec::with_capacity(rows.num_rows);
    for (i, (((((visamp, visamperr), visphi), visphierr), cflux), cfluxerr)) in visamp
        .into_iter()
        .zip(visamperr)
        .zip(visphi)
        .zip(visphierr)
        .zip(cflux)
        .zip(cfluxerr)
        .enumerate()
    {
        out.push(Visibility {
            time: rows.times[i],
            int_time: rows.int_time[i],
            visamp,
            visamperr,
            visphi,
            visphierr,
            cflux,
            cfluxerr,
            flag: flag[i].clone(),
            ucoord: ucoord[i],
            vcoord: vcoord[i],
            refs: rows.refs(i)?,
        });
    }
    trace!("{}: {} rows", rows.name, out.len());
    Ok(out)
}

fn read_vis2(rows: &Rows) -> Result<Vec<SquaredVisibility>, ReadError> {
    let vis2data = rows.channels("VIS2DATA")?;
    let vis2err = rows.channels("VIS2ERR")?;
    let flag = rows.flags()?;
    let ucoord = rows.section.f64_column("UCOORD")?;
    let vcoord = rows.section.f64_column("VCOORD")?;

    let mut out = Vec::with_capacity(rows.num_rows);
    for (i, (vis2data, vis2err)) in vis2data.into_iter().zip(vis2err).enumerate() {
        out.push(SquaredVisibility {
            time: rows.times[i],
            int_time: rows.int_time[i],
            vis2data,
            vis2err,
            flag: flag[i].clone(),
            ucoord: ucoord[i],
            vcoord: vcoord[i],
            refs: rows.refs(i)?,
        });
    }
    trace!("{}: {} rows", rows.name, out.len());
    Ok(out)
}

fn read_t3(rows: &Rows) -> Result<Vec<ClosurePhase>, ReadError> {
    let t3amp = rows.channels("T3AMP")?;
    let t3amperr = rows.channels("T3AMPERR")?;
    let t3phi = rows.channels("T3PHI")?;
    let t3phierr = rows.channels("T3PHIERR")?;
    let flag = rows.flags()?;
    let u1coord = rows.section.f64_column("U1COORD")?;
    let v1coord = rows.section.f64_column("V1COORD")?;
    let u2coord = rows.section.f64_column("U2COORD")?;
    let v2coord = rows.section.f64_column("V2COORD")?;

    let mut out = Vec::with_capacity(rows.num_rows);
    for (i, (((t3amp, t3amperr), t3phi), t3phierr)) in t3amp
        .into_iter()
        .zip(t3amperr)
        .zip(t3phi)
        .zip(t3phierr)
        .enumerate()
    {
        out.push(ClosurePhase {
            time: rows.times[i],
            int_time: rows.int_time[i],
            t3amp,
            t3amperr,
            t3phi,
            t3phierr,
            flag: flag[i].clone(),
            u1coord: u1coord[i],
            v1coord: v1coord[i],
            u2coord: u2coord[i],
            v2coord: v2coord[i],
            refs: rows.refs(i)?,
        });
    }
    trace!("{}: {} rows", rows.name, out.len());
    Ok(out)
}
