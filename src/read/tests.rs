use approx::assert_abs_diff_eq;
use hifitime::Epoch;

use super::*;
use crate::{
    table::{Column, ColumnData, MemoryStore},
    tests::full_dataset,
    write::dataset_to_sections,
};

fn full_sections() -> Vec<Section> {
    dataset_to_sections(&full_dataset()).unwrap()
}

fn section_mut<'a>(sections: &'a mut [Section], name: &str) -> &'a mut Section {
    sections.iter_mut().find(|s| s.name == name).unwrap()
}

fn column_mut<'a>(section: &'a mut Section, name: &str) -> &'a mut Column {
    section.columns.iter_mut().find(|c| c.name == name).unwrap()
}

fn read(sections: Vec<Section>) -> Result<Dataset, ReadError> {
    read_dataset(&MemoryStore::new(sections))
}

#[test]
fn unknown_sections_are_ignored() {
    let mut sections = full_sections();
    let mut flux = Section::new("OI_FLUX");
    flux.push_column(Column::doubles("FLUXDATA", vec![1.0]));
    sections.insert(3, flux);
    let d = read(sections).unwrap();
    assert_eq!(d.num_measurements(), 6);
}

#[test]
fn entities_are_read() {
    let d = read(full_sections()).unwrap();
    assert_eq!(d.wavelengths.keys().collect::<Vec<_>>(), ["INST1", "INST3"]);
    assert_eq!(d.wavelengths["INST3"].eff_wave, vec![1.5e-6, 1.75e-6, 2.0e-6]);
    assert_eq!(d.targets[1].name, "Betelgeuse");
    assert_eq!(d.targets[1].veltyp, "HELIOCEN");
    assert_eq!(d.targets[1].parallax, 1.5e-6);
    let vlti = &d.arrays["VLTI"];
    assert_eq!(vlti.stations.len(), 3);
    assert_eq!(vlti.stations[1].staxyz, [14.8, 24.4, 0.0]);
    assert_eq!(vlti.stations[1].diameter, 1.8);
}

#[test]
fn unresolved_target_aborts_the_read() {
    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_T3), "TARGET_ID").data = ColumnData::Short(vec![9]);
    let err = read(sections).unwrap_err();
    assert_eq!(
        err,
        ReadError::UnknownTarget {
            section: OI_T3,
            row: 0,
            target_id: 9
        }
    );
    assert!(err.is_reference_error());
}

#[test]
fn unresolved_station_aborts_the_read() {
    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_T3), "STA_INDEX").data =
        ColumnData::Short(vec![1, 2, 7]);
    let err = read(sections).unwrap_err();
    assert_eq!(
        err,
        ReadError::UnknownStation {
            section: OI_T3,
            row: 0,
            arrname: "VLTI".to_string(),
            sta_index: 7
        }
    );
    assert!(err.is_reference_error());
}

#[test]
fn partial_stations_are_a_format_error() {
    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_T3), "STA_INDEX").data =
        ColumnData::Short(vec![1, -1, 3]);
    let err = read(sections).unwrap_err();
    assert_eq!(
        err,
        ReadError::PartialStations {
            section: OI_T3,
            row: 0
        }
    );
    assert!(!err.is_reference_error());
}

#[test]
fn unresolved_instrument_and_array_abort_the_read() {
    let mut sections = full_sections();
    section_mut(&mut sections, OI_T3)
        .header
        .set("INSNAME", "NOPE", None);
    assert_eq!(
        read(sections).unwrap_err(),
        ReadError::UnknownInstrument {
            section: OI_T3,
            insname: "NOPE".to_string()
        }
    );

    let mut sections = full_sections();
    section_mut(&mut sections, OI_T3)
        .header
        .set("ARRNAME", "CHARA", None);
    assert_eq!(
        read(sections).unwrap_err(),
        ReadError::UnknownArray {
            section: OI_T3,
            arrname: "CHARA".to_string()
        }
    );
}

#[test]
fn no_array_means_no_stations() {
    let mut sections = full_sections();
    section_mut(&mut sections, OI_T3)
        .header
        .set("ARRNAME", "", None);
    let d = read(sections).unwrap();
    assert_eq!(d.t3[0].refs.array, None);
    assert_eq!(d.t3[0].refs.stations, None);
}

#[test]
fn missing_keys_and_columns_are_format_errors() {
    let mut sections = full_sections();
    section_mut(&mut sections, OI_VIS2)
        .columns
        .retain(|c| c.name != "VIS2ERR");
    assert_eq!(
        read(sections).unwrap_err(),
        ReadError::MissingColumn {
            section: OI_VIS2.to_string(),
            column: "VIS2ERR".to_string()
        }
    );

    let mut wavelength = Section::new(OI_WAVELENGTH);
    wavelength.push_column(Column::doubles("EFF_WAVE", vec![1e-6]));
    wavelength.push_column(Column::doubles("EFF_BAND", vec![1e-8]));
    assert_eq!(
        read(vec![wavelength]).unwrap_err(),
        ReadError::MissingKey {
            section: OI_WAVELENGTH.to_string(),
            key: "INSNAME".to_string()
        }
    );
}

#[test]
fn duplicate_keys_are_format_errors() {
    let mut sections = full_sections();
    sections.insert(2, sections[1].clone());
    assert_eq!(
        read(sections).unwrap_err(),
        ReadError::DuplicateName {
            section: OI_WAVELENGTH,
            key: "INSNAME",
            name: "INST1".to_string()
        }
    );

    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_TARGET), "TARGET_ID").data =
        ColumnData::Short(vec![4, 4]);
    assert_eq!(
        read(sections).unwrap_err(),
        ReadError::DuplicateTargetId {
            section: OI_TARGET,
            target_id: 4
        }
    );

    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_ARRAY), "STA_INDEX").data =
        ColumnData::Short(vec![1, 2, 1]);
    assert!(matches!(
        read(sections).unwrap_err(),
        ReadError::DuplicateStationIndex { sta_index: 1, .. }
    ));
}

#[test]
fn mismatched_wavelength_columns_are_rejected() {
    let mut wavelength = Section::new(OI_WAVELENGTH);
    wavelength.header.set("INSNAME", "INST1", None);
    wavelength.push_column(Column::doubles("EFF_WAVE", vec![1e-6, 2e-6]));
    wavelength.push_column(Column::doubles("EFF_BAND", vec![1e-8]));
    assert!(matches!(
        read(vec![wavelength]).unwrap_err(),
        ReadError::Wavelength {
            source: ModelError::WavelengthLength {
                num_wave: 2,
                num_band: 1
            },
            ..
        }
    ));
}

#[test]
fn timestamps_come_from_date_obs_and_time() {
    let t1 = Epoch::from_gregorian_utc(2020, 6, 1, 3, 31, 30, 250_000_000);
    let mut sections = full_sections();
    let t3 = section_mut(&mut sections, OI_T3);
    t3.header.set("DATE-OBS", "2020-06-01", None);
    column_mut(t3, "TIME").data = ColumnData::Double(vec![3.0 * 3600.0 + 31.0 * 60.0 + 30.25]);
    let d = read(sections).unwrap();
    assert_eq!(d.t3[0].time, Some(t1));
}

#[test]
fn timestamps_fall_back_to_mjd() {
    let t1 = Epoch::from_gregorian_utc(2020, 6, 1, 3, 31, 30, 250_000_000);

    // An unusable DATE-OBS.
    let mut sections = full_sections();
    section_mut(&mut sections, OI_T3)
        .header
        .set("DATE-OBS", "sometime", None);
    let d = read(sections).unwrap();
    let time = d.t3[0].time.unwrap();
    assert_abs_diff_eq!((time - t1).to_seconds(), 0.0, epsilon = 1e-5);

    // A zero TIME.
    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_T3), "TIME").data = ColumnData::Double(vec![0.0]);
    let d = read(sections).unwrap();
    let time = d.t3[0].time.unwrap();
    assert_abs_diff_eq!((time - t1).to_seconds(), 0.0, epsilon = 1e-5);

    // Another writer's table: its own DATE-OBS, a zero TIME and a known MJD.
    let mut sections = full_sections();
    let t3 = section_mut(&mut sections, OI_T3);
    t3.header.set("DATE-OBS", "2020-06-01T00:00:00", None);
    column_mut(t3, "TIME").data = ColumnData::Double(vec![0.0]);
    column_mut(t3, "MJD").data = ColumnData::Double(vec![59001.125]);
    let d = read(sections).unwrap();
    let time = d.t3[0].time.unwrap();
    let expected = Epoch::from_gregorian_utc_hms(2020, 6, 1, 3, 0, 0);
    assert_abs_diff_eq!((time - expected).to_seconds(), 0.0, epsilon = 1e-5);

    // Neither TIME nor MJD.
    let mut sections = full_sections();
    let t3 = section_mut(&mut sections, OI_T3);
    t3.columns.retain(|c| c.name != "TIME" && c.name != "MJD");
    let d = read(sections).unwrap();
    assert_eq!(d.t3[0].time, None);
}

#[test]
fn all_nan_cflux_is_absent() {
    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_VIS), "CFLUX").data =
        ColumnData::Double(vec![f64::NAN; 3]);
    let d = read(sections).unwrap();
    assert_eq!(d.vis[0].cflux, None);
    assert_eq!(d.vis[0].cfluxerr, Some(vec![0.5, 0.5, 0.5]));
}

#[test]
fn ragged_sections_are_format_errors() {
    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_VIS), "UCOORD").data = ColumnData::Double(vec![]);
    let err = read(sections).unwrap_err();
    assert_eq!(
        err,
        ReadError::RowCount {
            section: OI_VIS.to_string(),
            column: "UCOORD".to_string(),
            len: 0,
            expected: 1
        }
    );
    assert!(!err.is_reference_error());

    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_VIS2), "VIS2DATA").data =
        ColumnData::Double(vec![0.5, 0.4]);
    assert!(matches!(
        read(sections).unwrap_err(),
        ReadError::RowCount { column, .. } if column == "VIS2DATA"
    ));

    let mut sections = full_sections();
    column_mut(section_mut(&mut sections, OI_TARGET), "RAEP0").data =
        ColumnData::Double(vec![279.2347]);
    assert!(matches!(
        read(sections).unwrap_err(),
        ReadError::RowCount { column, len: 1, expected: 2, .. } if column == "RAEP0"
    ));

    // A per-row value that's more than one element wide.
    let mut sections = full_sections();
    let diameter = column_mut(section_mut(&mut sections, OI_ARRAY), "DIAMETER");
    diameter.repeat = 2;
    diameter.data = ColumnData::Double(vec![1.8; 6]);
    assert!(matches!(
        read(sections).unwrap_err(),
        ReadError::RowCount { column, len: 6, expected: 3, .. } if column == "DIAMETER"
    ));
}
