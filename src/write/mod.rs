//! Turning a [`Dataset`] into OIFITS tables.
//!
//! Entities get their file-local keys here: `TARGET_ID` is a target's
//! position plus one, and `STA_INDEX` is a station's position within its
//! array plus one. Measurements of each kind are grouped by their (array,
//! instrument) pair and each group becomes one table, with channel columns
//! as wide as the instrument's wavelength table.

mod error;

pub use error::WriteError;

use hifitime::Epoch;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace, warn};

use crate::{
    constants::*,
    dataset::{ConsistencyError, RefCategory},
    model::*,
    table::{Column, ColumnData, Section, TableStore},
    time::{format_date, ref_epoch, time_and_mjd},
    Dataset,
};

/// Measurements sharing an (array, instrument) pair, each with its position
/// in the dataset.
type Groups<'a, M> = IndexMap<(Option<ArrayId>, WavelengthId), Vec<(usize, &'a M)>>;

/// Write `dataset` into `store`, replacing whatever it held. Nothing is
/// written if the dataset is inconsistent.
pub fn write_dataset(dataset: &Dataset, store: &mut dyn TableStore) -> Result<(), WriteError> {
    let sections = dataset_to_sections(dataset)?;
    store.write(sections)?;
    Ok(())
}

/// Lay out `dataset` as OIFITS sections: the primary header, then wavelength
/// tables, targets, arrays, and finally `OI_VIS`, `OI_VIS2` and `OI_T3`
/// tables.
pub fn dataset_to_sections(dataset: &Dataset) -> Result<Vec<Section>, WriteError> {
    dataset.check_consistency()?;

    let mut sections = vec![primary_section()];
    for (insname, table) in &dataset.wavelengths {
        sections.push(wavelength_section(insname, table));
    }
    if !dataset.targets.is_empty() {
        sections.push(target_section(&dataset.targets)?);
    }
    for (arrname, array) in &dataset.arrays {
        sections.push(array_section(arrname, array)?);
    }

    for (key, members) in group(&dataset.vis) {
        sections.push(vis_section(dataset, key, &members)?);
    }
    for (key, members) in group(&dataset.vis2) {
        sections.push(vis2_section(dataset, key, &members)?);
    }
    for (key, members) in group(&dataset.t3) {
        sections.push(t3_section(dataset, key, &members)?);
    }

    debug!("Laid out {} sections", sections.len());
    Ok(sections)
}

fn primary_section() -> Section {
    let now = Epoch::now().unwrap_or_else(|e| {
        warn!("Couldn't get the current time ({e}); using {}", ref_epoch());
        ref_epoch()
    });
    let mut s = Section::new(PRIMARY);
    s.header.set("DATE", format_date(now), Some("Creation date"));
    s.header
        .add_comment(format!("Written by {}", env!("CARGO_PKG_NAME")));
    s.header
        .add_comment(format!("Version {}", env!("CARGO_PKG_VERSION")));
    s
}

fn wavelength_section(insname: &str, table: &WavelengthTable) -> Section {
    let mut s = Section::new(OI_WAVELENGTH);
    s.header.set("OI_REVN", OI_REVN, Some("Revision number of the table definition"));
    s.header.set("INSNAME", insname, Some("Name of detector, for cross-referencing"));
    s.push_column(
        Column::new("EFF_WAVE", 1, ColumnData::Float(to_f32(&table.eff_wave))).with_unit("METERS"),
    );
    s.push_column(
        Column::new("EFF_BAND", 1, ColumnData::Float(to_f32(&table.eff_band))).with_unit("METERS"),
    );
    s
}

fn target_section(targets: &[Target]) -> Result<Section, WriteError> {
    let mut s = Section::new(OI_TARGET);
    s.header.set("OI_REVN", OI_REVN, Some("Revision number of the table definition"));

    let target_ids = (0..targets.len())
        .map(|i| file_index("Target", i))
        .collect::<Result<Vec<_>, _>>()?;
    let text = |width: usize, f: fn(&Target) -> &str| {
        targets
            .iter()
            .map(|t| truncate(f(t), width))
            .collect_vec()
    };
    let doubles = |f: fn(&Target) -> f64| targets.iter().map(f).collect_vec();
    let floats = |f: fn(&Target) -> f64| targets.iter().map(|t| f(t) as f32).collect_vec();

    s.push_column(Column::new("TARGET_ID", 1, ColumnData::Short(target_ids)));
    s.push_column(Column::text("TARGET", NAME_WIDTH, text(NAME_WIDTH, |t| &t.name)));
    s.push_column(Column::doubles("RAEP0", doubles(|t| t.ra.degrees())).with_unit("DEGREES"));
    s.push_column(Column::doubles("DECEP0", doubles(|t| t.dec.degrees())).with_unit("DEGREES"));
    s.push_column(
        Column::new("EQUINOX", 1, ColumnData::Float(floats(|t| t.equinox))).with_unit("YEARS"),
    );
    s.push_column(Column::doubles("RA_ERR", doubles(|t| t.ra_err)).with_unit("DEGREES"));
    s.push_column(Column::doubles("DEC_ERR", doubles(|t| t.dec_err)).with_unit("DEGREES"));
    s.push_column(Column::doubles("SYSVEL", doubles(|t| t.sysvel)).with_unit("M/S"));
    s.push_column(Column::text("VELTYP", VEL_WIDTH, text(VEL_WIDTH, |t| &t.veltyp)));
    s.push_column(Column::text("VELDEF", VEL_WIDTH, text(VEL_WIDTH, |t| &t.veldef)));
    s.push_column(Column::doubles("PMRA", doubles(|t| t.pmra)).with_unit("DEG/YR"));
    s.push_column(Column::doubles("PMDEC", doubles(|t| t.pmdec)).with_unit("DEG/YR"));
    s.push_column(Column::doubles("PMRA_ERR", doubles(|t| t.pmra_err)).with_unit("DEG/YR"));
    s.push_column(Column::doubles("PMDEC_ERR", doubles(|t| t.pmdec_err)).with_unit("DEG/YR"));
    s.push_column(
        Column::new("PARALLAX", 1, ColumnData::Float(floats(|t| t.parallax))).with_unit("DEGREES"),
    );
    s.push_column(
        Column::new("PARA_ERR", 1, ColumnData::Float(floats(|t| t.para_err))).with_unit("DEGREES"),
    );
    s.push_column(Column::text("SPECTYP", NAME_WIDTH, text(NAME_WIDTH, |t| &t.spectyp)));
    Ok(s)
}

fn array_section(arrname: &str, array: &ArrayDescriptor) -> Result<Section, WriteError> {
    let mut s = Section::new(OI_ARRAY);
    s.header.set("OI_REVN", OI_REVN, Some("Revision number of the table definition"));
    s.header.set("ARRNAME", arrname, Some("Array name, for cross-referencing"));
    s.header.set("FRAME", array.frame.as_str(), Some("Coordinate frame"));
    s.header.set("ARRAYX", array.arrxyz[0], Some("[m] Array centre x coordinate"));
    s.header.set("ARRAYY", array.arrxyz[1], Some("[m] Array centre y coordinate"));
    s.header.set("ARRAYZ", array.arrxyz[2], Some("[m] Array centre z coordinate"));

    let stations = &array.stations;
    let sta_index = (0..stations.len())
        .map(|i| file_index("Station", i))
        .collect::<Result<Vec<_>, _>>()?;
    s.push_column(Column::text(
        "TEL_NAME",
        NAME_WIDTH,
        stations
            .iter()
            .map(|st| truncate(&st.tel_name, NAME_WIDTH))
            .collect(),
    ));
    s.push_column(Column::text(
        "STA_NAME",
        NAME_WIDTH,
        stations
            .iter()
            .map(|st| truncate(&st.sta_name, NAME_WIDTH))
            .collect(),
    ));
    s.push_column(Column::new("STA_INDEX", 1, ColumnData::Short(sta_index)));
    s.push_column(
        Column::new(
            "DIAMETER",
            1,
            ColumnData::Float(stations.iter().map(|st| st.diameter as f32).collect()),
        )
        .with_unit("METERS"),
    );
    s.push_column(
        Column::new(
            "STAXYZ",
            3,
            ColumnData::Double(stations.iter().flat_map(|st| st.staxyz).collect()),
        )
        .with_unit("METERS"),
    );
    Ok(s)
}

fn group<const N: usize, M: Measurement<N>>(measurements: &[M]) -> Groups<'_, M> {
    let mut groups: Groups<M> = IndexMap::new();
    for (i, m) in measurements.iter().enumerate() {
        let refs = m.refs();
        groups
            .entry((refs.array, refs.wavelength))
            .or_default()
            .push((i, m));
    }
    groups
}

/// The headers and leading columns shared by every measurement table. Also
/// returns the group's channel count.
fn measurement_section<const N: usize, M: Measurement<N>>(
    dataset: &Dataset,
    (array, wavelength): (Option<ArrayId>, WavelengthId),
    members: &[(usize, &M)],
) -> Result<(Section, usize), WriteError> {
    let dangling = |category| {
        WriteError::Inconsistent(ConsistencyError {
            kind: M::KIND,
            index: members.first().map(|(i, _)| *i).unwrap_or_default(),
            category,
        })
    };
    let insname = dataset
        .insname(wavelength)
        .ok_or_else(|| dangling(RefCategory::Wavelength))?;
    let num_channels = dataset
        .wavelength(wavelength)
        .map(|w| w.num_channels())
        .ok_or_else(|| dangling(RefCategory::Wavelength))?;

    let arrname = match array {
        Some(array) => Some(
            dataset
                .arrname(array)
                .ok_or_else(|| dangling(RefCategory::Array))?,
        ),
        None => None,
    };
    trace!(
        "{}: {} rows for ({}, {insname})",
        M::KIND.extname(),
        members.len(),
        arrname.unwrap_or("no array"),
    );

    let mut s = Section::new(M::KIND.extname());
    s.header.set("OI_REVN", OI_REVN, Some("Revision number of the table definition"));
    s.header.set(
        "DATE-OBS",
        format_date(ref_epoch()),
        Some("UTC start date of observations"),
    );
    if let Some(arrname) = arrname {
        s.header.set("ARRNAME", arrname, Some("Array name"));
    }
    s.header.set("INSNAME", insname, Some("Detector name"));

    let target_ids = members
        .iter()
        .map(|(_, m)| file_index("Target", m.refs().target.0))
        .collect::<Result<Vec<_>, _>>()?;
    let (time, mjd): (Vec<f64>, Vec<f64>) =
        members.iter().map(|(_, m)| time_and_mjd(m.time())).unzip();
    s.push_column(Column::new("TARGET_ID", 1, ColumnData::Short(target_ids)));
    s.push_column(Column::doubles("TIME", time).with_unit("SECONDS"));
    s.push_column(Column::doubles("MJD", mjd).with_unit("DAY"));
    s.push_column(
        Column::doubles("INT_TIME", members.iter().map(|(_, m)| m.int_time()).collect())
            .with_unit("SECONDS"),
    );
    Ok((s, num_channels))
}

/// The trailing `STA_INDEX` and `FLAG` columns.
fn finish_section<const N: usize, M: Measurement<N>>(
    s: &mut Section,
    members: &[(usize, &M)],
    num_channels: usize,
) -> Result<(), WriteError> {
    let mut sta_index = Vec::with_capacity(members.len() * N);
    for (_, m) in members {
        match m.refs().stations {
            Some(stations) => {
                for station in stations {
                    sta_index.push(file_index("Station", station.0)?);
                }
            }
            None => sta_index.extend([NO_STATION; N]),
        }
    }
    s.push_column(Column::new("STA_INDEX", N, ColumnData::Short(sta_index)));

    let mut flag = Vec::with_capacity(members.len() * num_channels);
    for (index, m) in members {
        if m.flag().len() != num_channels {
            return Err(WriteError::ChannelLength {
                kind: M::KIND,
                index: *index,
                quantity: "FLAG",
                len: m.flag().len(),
                expected: num_channels,
            });
        }
        flag.extend_from_slice(m.flag());
    }
    s.push_column(Column::new("FLAG", num_channels, ColumnData::Logical(flag)));
    Ok(())
}

fn vis_section(
    dataset: &Dataset,
    key: (Option<ArrayId>, WavelengthId),
    members: &[(usize, &Visibility)],
) -> Result<Section, WriteError> {
    let (mut s, n) = measurement_section(dataset, key, members)?;
    let kind = MeasurementKind::Visibility;
    let rows = |f: fn(&Visibility) -> &[f64]| members.iter().map(move |(i, m)| (*i, f(m)));
    let optional_rows = |f: fn(&Visibility) -> Option<&[f64]>| {
        members.iter().map(|(i, m)| (*i, f(m))).collect_vec()
    };

    s.push_column(channel_column(kind, "VISAMP", n, rows(|m| &m.visamp))?);
    s.push_column(channel_column(kind, "VISAMPERR", n, rows(|m| &m.visamperr))?);
    s.push_column(channel_column(kind, "VISPHI", n, rows(|m| &m.visphi))?.with_unit("DEGREES"));
    s.push_column(
        channel_column(kind, "VISPHIERR", n, rows(|m| &m.visphierr))?.with_unit("DEGREES"),
    );
    let cflux = optional_rows(|m| m.cflux.as_deref());
    if let Some(column) = optional_channel_column(kind, "CFLUX", n, cflux)? {
        s.push_column(column);
    }
    let cfluxerr = optional_rows(|m| m.cfluxerr.as_deref());
    if let Some(column) = optional_channel_column(kind, "CFLUXERR", n, cfluxerr)? {
        s.push_column(column);
    }
    s.push_column(
        Column::doubles("UCOORD", members.iter().map(|(_, m)| m.ucoord).collect())
            .with_unit("METERS"),
    );
    s.push_column(
        Column::doubles("VCOORD", members.iter().map(|(_, m)| m.vcoord).collect())
            .with_unit("METERS"),
    );
    finish_section(&mut s, members, n)?;
    Ok(s)
}

fn vis2_section(
    dataset: &Dataset,
    key: (Option<ArrayId>, WavelengthId),
    members: &[(usize, &SquaredVisibility)],
) -> Result<Section, WriteError> {
    let (mut s, n) = measurement_section(dataset, key, members)?;
    let kind = MeasurementKind::SquaredVisibility;
    let rows = |f: fn(&SquaredVisibility) -> &[f64]| members.iter().map(move |(i, m)| (*i, f(m)));

    s.push_column(channel_column(kind, "VIS2DATA", n, rows(|m| &m.vis2data))?);
    s.push_column(channel_column(kind, "VIS2ERR", n, rows(|m| &m.vis2err))?);
    s.push_column(
        Column::doubles("UCOORD", members.iter().map(|(_, m)| m.ucoord).collect())
            .with_unit("METERS"),
    );
    s.push_column(
        Column::doubles("VCOORD", members.iter().map(|(_, m)| m.vcoord).collect())
            .with_unit("METERS"),
    );
    finish_section(&mut s, members, n)?;
    Ok(s)
}

fn t3_section(
    dataset: &Dataset,
    key: (Option<ArrayId>, WavelengthId),
    members: &[(usize, &ClosurePhase)],
) -> Result<Section, WriteError> {
    let (mut s, n) = measurement_section(dataset, key, members)?;
    let kind = MeasurementKind::ClosurePhase;
    let rows = |f: fn(&ClosurePhase) -> &[f64]| members.iter().map(move |(i, m)| (*i, f(m)));
    let coord = |name: &str, f: fn(&ClosurePhase) -> f64| {
        Column::doubles(name, members.iter().map(|(_, m)| f(m)).collect()).with_unit("METERS")
    };

    s.push_column(channel_column(kind, "T3AMP", n, rows(|m| &m.t3amp))?);
    s.push_column(channel_column(kind, "T3AMPERR", n, rows(|m| &m.t3amperr))?);
    s.push_column(channel_column(kind, "T3PHI", n, rows(|m| &m.t3phi))?.with_unit("DEGREES"));
    s.push_column(
        channel_column(kind, "T3PHIERR", n, rows(|m| &m.t3phierr))?.with_unit("DEGREES"),
    );
    s.push_column(coord("U1COORD", |m| m.u1coord));
    s.push_column(coord("V1COORD", |m| m.v1coord));
    s.push_column(coord("U2COORD", |m| m.u2coord));
    s.push_column(coord("V2COORD", |m| m.v2coord));
    finish_section(&mut s, members, n)?;
    Ok(s)
}

/// One `nD` column from per-row channel values. Every row must have exactly
/// `num_channels` values.
fn channel_column<'a>(
    kind: MeasurementKind,
    quantity: &'static str,
    num_channels: usize,
    rows: impl Iterator<Item = (usize, &'a [f64])>,
) -> Result<Column, WriteError> {
    let mut data = vec![];
    for (index, values) in rows {
        if values.len() != num_channels {
            return Err(WriteError::ChannelLength {
                kind,
                index,
                quantity,
                len: values.len(),
                expected: num_channels,
            });
        }
        data.extend_from_slice(values);
    }
    Ok(Column::new(quantity, num_channels, ColumnData::Double(data)))
}

/// Like [`channel_column`], but rows may lack values (written as NaN). If no
/// row has values, there's no column.
fn optional_channel_column(
    kind: MeasurementKind,
    quantity: &'static str,
    num_channels: usize,
    rows: Vec<(usize, Option<&[f64]>)>,
) -> Result<Option<Column>, WriteError> {
    if rows.iter().all(|(_, values)| values.is_none()) {
        return Ok(None);
    }
    let nan = vec![f64::NAN; num_channels];
    let rows = rows
        .into_iter()
        .map(|(i, values)| (i, values.unwrap_or(nan.as_slice())));
    channel_column(kind, quantity, num_channels, rows).map(Some)
}

/// The 1-based key written for the entity at position `index`.
fn file_index(what: &'static str, index: usize) -> Result<i16, WriteError> {
    i16::try_from(index + 1).map_err(|_| WriteError::IndexOverflow { what, index })
}

/// Text columns are `width` bytes wide; longer values lose their tails, cut
/// on a character boundary.
fn truncate(s: &str, width: usize) -> String {
    let mut end = s.len().min(width);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}
