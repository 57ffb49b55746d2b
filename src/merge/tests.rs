use approx::assert_abs_diff_eq;
use hifitime::Epoch;

use super::*;
use crate::{
    angle::Angle,
    tests::{full_dataset, station, vega_dataset},
};

fn vlti_only(arrxyz: [f64; 3], stations: Vec<Station>) -> Dataset {
    let mut d = vega_dataset();
    let mut array = ArrayDescriptor::new("GEOCENTRIC", arrxyz);
    for s in stations {
        array.add_station(s);
    }
    let a = d.add_array("VLTI", array);
    let n = d.arrays[0].stations.len();
    let refs = d.t3[0].refs.clone();
    d.t3[0].refs = refs.with_array(a, [StationId(0), StationId(1 % n), StationId(2 % n)]);
    d
}

#[test]
fn merging_with_empty_is_identity() {
    let d = full_dataset();
    let config = MergeConfig::default();
    assert_eq!(combine(&d, &Dataset::new(), &config).unwrap(), d);
    assert_eq!(combine(&Dataset::new(), &d, &config).unwrap(), d);
}

#[test]
fn merging_with_self_is_idempotent() {
    let d = full_dataset();
    let merged = d.combine(&d, &MergeConfig::default()).unwrap();
    assert_eq!(merged, d);
    assert_eq!(merged.targets.len(), 2);
    assert_eq!(merged.arrays[0].stations.len(), 3);
    assert_eq!(merged.num_measurements(), 6);
}

#[test]
fn inconsistent_inputs_are_refused() {
    let good = full_dataset();
    let mut bad = full_dataset();
    bad.vis[1].refs.target = TargetId(5);

    let result = combine(&good, &bad, &MergeConfig::default());
    assert!(matches!(
        result,
        Err(MergeError::Inconsistent {
            side: Side::Other,
            ..
        })
    ));
    let result = combine(&bad, &good, &MergeConfig::default());
    assert!(matches!(
        result,
        Err(MergeError::Inconsistent {
            side: Side::Base,
            source: ConsistencyError {
                index: 1,
                ..
            }
        })
    ));
}

#[test]
fn differing_wavelength_tables_under_one_name_conflict() {
    let a = vega_dataset();
    let mut b = vega_dataset();
    b.wavelengths[0].eff_band[0] = 2.0e-8;
    let result = combine(&a, &b, &MergeConfig::default());
    match result {
        Err(MergeError::WavelengthConflict { insname }) => assert_eq!(insname, "INST1"),
        _ => panic!("expected a wavelength conflict"),
    }
}

#[test]
fn differing_stations_under_one_name_conflict() {
    let centre = [1000.0, 2000.0, 3000.0];
    let a = vlti_only(
        centre,
        vec![
            station("T1", "S1", [1.0, 0.0, 0.0]),
            station("T2", "S2", [0.0, 1.0, 0.0]),
        ],
    );
    let b = vlti_only(
        centre,
        vec![
            station("T1", "S1", [1.0, 0.0, 0.0]),
            station("T2", "S2", [0.0, 5.0, 0.0]),
        ],
    );
    let result = combine(&a, &b, &MergeConfig::default());
    match result {
        Err(MergeError::StationConflict { arrname, sta_name }) => {
            assert_eq!(arrname, "VLTI");
            assert_eq!(sta_name, "S2");
        }
        _ => panic!("expected a station conflict"),
    }

    // Matching stations by name resolves the conflict in favour of the base.
    let config = MergeConfig {
        match_station_by_name: true,
        ..Default::default()
    };
    let merged = combine(&a, &b, &config).unwrap();
    assert_eq!(merged.arrays[0].stations, a.arrays[0].stations);
    // The two closure phases now refer to the same stations and are equal.
    assert_eq!(merged.t3.len(), 1);
}

#[test]
fn unique_stations_are_relocated() {
    let a = vlti_only(
        [1000.0, 2000.0, 3000.0],
        vec![
            station("T1", "S1", [1.0, 0.0, 0.0]),
            station("T2", "S2", [0.0, 1.0, 0.0]),
        ],
    );
    let b = vlti_only(
        [1010.0, 1990.0, 3000.5],
        vec![
            station("T1", "S1", [1.0, 0.0, 0.0]),
            station("T3", "S3", [5.0, 6.0, 7.0]),
        ],
    );
    let merged = combine(&a, &b, &MergeConfig::default()).unwrap();
    let stations = &merged.arrays[0].stations;
    assert_eq!(stations.len(), 3);
    assert_eq!(stations[2].sta_name, "S3");
    // other_staxyz - other_arrxyz + result_arrxyz
    assert_abs_diff_eq!(stations[2].staxyz[0], 5.0 - 1010.0 + 1000.0);
    assert_abs_diff_eq!(stations[2].staxyz[1], 6.0 - 1990.0 + 2000.0);
    assert_abs_diff_eq!(stations[2].staxyz[2], 7.0 - 3000.5 + 3000.0);
    assert_eq!(merged.arrays[0].arrxyz, [1000.0, 2000.0, 3000.0]);

    // The merged closure phase from `b` refers to S1, S3, S1 in the result.
    assert_eq!(merged.t3.len(), 2);
    assert_eq!(
        merged.t3[1].refs.stations,
        Some([StationId(0), StationId(2), StationId(0)])
    );
    assert!(merged.is_consistent());
}

#[test]
fn targets_with_same_name_but_different_values() {
    let a = vega_dataset();
    let mut b = vega_dataset();
    b.targets[0].ra = Angle(279.25);

    let merged = combine(&a, &b, &MergeConfig::default()).unwrap();
    assert_eq!(merged.targets.len(), 2);
    assert_eq!(merged.targets[1].ra, Angle(279.25));
    assert_eq!(merged.t3.len(), 2);
    assert_eq!(merged.t3[1].refs.target, TargetId(1));

    let config = MergeConfig {
        match_target_by_name: true,
        ..Default::default()
    };
    let merged = combine(&a, &b, &config).unwrap();
    assert_eq!(merged.targets, a.targets);
    assert_eq!(merged.t3.len(), 1);
}

#[test]
fn handles_are_translated() {
    let mut base = vega_dataset();
    base.wavelengths[0] = WavelengthTable::new(vec![2.2e-6], vec![4e-7]).unwrap();
    let other = full_dataset();
    let merged = combine(&base, &other, &MergeConfig::default()).unwrap();
    assert!(merged.is_consistent());

    // INST1 already existed with an equal table, so only INST3 is adopted.
    assert_eq!(
        merged.wavelengths.keys().collect::<Vec<_>>(),
        vec!["INST1", "INST3"]
    );
    // Vega matched by value; Betelgeuse was appended.
    assert_eq!(merged.targets.len(), 2);

    for (merged_vis2, other_vis2) in merged.vis2.iter().zip(other.vis2.iter()) {
        assert_eq!(
            merged.insname(merged_vis2.refs.wavelength),
            other.insname(other_vis2.refs.wavelength)
        );
        assert_eq!(
            merged.target(merged_vis2.refs.target).map(|t| &t.name),
            other.target(other_vis2.refs.target).map(|t| &t.name)
        );
    }
    assert_eq!(merged.vis[0].refs.wavelength, WavelengthId(1));
    assert_eq!(merged.vis[1].refs.wavelength, WavelengthId(0));
    assert_eq!(merged.t3.len(), 2);
    assert_eq!(merged.num_measurements(), 7);
}

#[test]
fn duplicate_policy_controls_timestamp_handling() {
    let a = full_dataset();
    let mut b = full_dataset();
    for m in b.vis2.iter_mut() {
        m.time = Some(Epoch::from_gregorian_utc_at_midnight(2010, 1, 1));
    }

    let merged = combine(&a, &b, &MergeConfig::default()).unwrap();
    assert_eq!(merged.vis2.len(), 6);

    let config = MergeConfig {
        duplicates: DuplicatePolicy::IgnoreTime,
        ..Default::default()
    };
    let merged = combine(&a, &b, &config).unwrap();
    assert_eq!(merged, a);
}

#[test]
fn nan_in_flagged_channels_is_still_a_duplicate() {
    let mut d = vega_dataset();
    d.t3[0].t3amp = vec![f64::NAN];
    d.t3[0].t3amperr = vec![f64::NAN];
    d.t3[0].flag = vec![true];

    let merged = d.combine(&d, &MergeConfig::default()).unwrap();
    assert_eq!(merged.t3.len(), 1);

    // Differing values hidden behind a flag don't matter either.
    let mut other = d.clone();
    other.t3[0].t3amp = vec![0.9];
    let merged = d.combine(&other, &MergeConfig::default()).unwrap();
    assert_eq!(merged.t3.len(), 1);

    // The flag itself does.
    other.t3[0].flag = vec![false];
    let merged = d.combine(&other, &MergeConfig::default()).unwrap();
    assert_eq!(merged.t3.len(), 2);
}
