//! Helpful functions for tests.

use hifitime::Epoch;

use crate::{angle::Angle, model::*, Dataset};

pub(crate) fn station(tel_name: &str, sta_name: &str, staxyz: [f64; 3]) -> Station {
    Station {
        tel_name: tel_name.to_string(),
        sta_name: sta_name.to_string(),
        diameter: 1.8,
        staxyz,
    }
}

/// One single-channel instrument, one target, no array and a single closure
/// phase.
pub(crate) fn vega_dataset() -> Dataset {
    let mut d = Dataset::new();
    let w = d.add_wavelength(
        "INST1",
        WavelengthTable::new(vec![1.0e-6], vec![1.0e-8]).unwrap(),
    );
    let t = d.add_target(Target::new("Vega", Angle(279.2347), Angle(38.7837)));
    d.t3.push(ClosurePhase {
        time: None,
        int_time: 10.0,
        t3amp: vec![0.5],
        t3amperr: vec![0.05],
        t3phi: vec![12.0],
        t3phierr: vec![1.0],
        flag: vec![false],
        u1coord: 10.0,
        v1coord: 5.0,
        u2coord: -2.0,
        v2coord: 8.0,
        refs: Refs::new(w, t),
    });
    d
}

/// Two instruments (1 and 3 channels), two targets, one array with three
/// stations and measurements of every kind, with and without arrays and
/// timestamps.
pub(crate) fn full_dataset() -> Dataset {
    let mut d = Dataset::new();
    let w1 = d.add_wavelength("INST1", WavelengthTable::new(vec![2.2e-6], vec![4e-7]).unwrap());
    let w3 = d.add_wavelength(
        "INST3",
        WavelengthTable::new(vec![1.5e-6, 1.75e-6, 2.0e-6], vec![2.5e-7; 3]).unwrap(),
    );

    let vega = d.add_target(Target::new("Vega", Angle(279.2347), Angle(38.7837)));
    let mut betelgeuse = Target::new("Betelgeuse", Angle(88.7929), Angle(7.4071));
    betelgeuse.sysvel = 21_910.0;
    betelgeuse.veltyp = "HELIOCEN".to_string();
    betelgeuse.spectyp = "M1Ia".to_string();
    betelgeuse.parallax = 1.5e-6;
    let betelgeuse = d.add_target(betelgeuse);

    let mut vlti = ArrayDescriptor::new("GEOCENTRIC", [1_946_404.3, -5_467_644.3, -2_642_728.2]);
    let s1 = vlti.add_station(station("UT1", "U1", [-9.9, -20.3, 0.0]));
    let s2 = vlti.add_station(station("UT2", "U2", [14.8, 24.4, 0.0]));
    let s3 = vlti.add_station(station("UT3", "U3", [44.9, 54.9, 0.0]));
    let vlti = d.add_array("VLTI", vlti);

    let t0 = Epoch::from_gregorian_utc(2004, 11, 3, 6, 30, 0, 0);
    // Several leap seconds apart.
    let t1 = Epoch::from_gregorian_utc(2020, 6, 1, 3, 31, 30, 250_000_000);

    d.vis.push(Visibility {
        time: Some(t0),
        int_time: 30.0,
        visamp: vec![0.8, 0.7, 0.6],
        visamperr: vec![0.01, 0.02, 0.03],
        visphi: vec![1.0, 2.0, 3.0],
        visphierr: vec![0.1, 0.2, 0.3],
        cflux: Some(vec![10.0, 11.0, 12.0]),
        cfluxerr: Some(vec![0.5, 0.5, 0.5]),
        flag: vec![false, true, false],
        ucoord: 20.0,
        vcoord: -12.5,
        refs: Refs::new(w3, vega).with_array(vlti, [s1, s2]),
    });
    d.vis.push(Visibility {
        time: None,
        int_time: 15.0,
        visamp: vec![0.3],
        visamperr: vec![0.02],
        visphi: vec![-4.0],
        visphierr: vec![0.5],
        cflux: None,
        cfluxerr: None,
        flag: vec![false],
        ucoord: 3.0,
        vcoord: 4.0,
        refs: Refs::new(w1, betelgeuse),
    });

    d.vis2.push(SquaredVisibility {
        time: Some(t0),
        int_time: 30.0,
        vis2data: vec![0.64, 0.49, 0.36],
        vis2err: vec![0.01; 3],
        flag: vec![false; 3],
        ucoord: 20.0,
        vcoord: -12.5,
        refs: Refs::new(w3, vega).with_array(vlti, [s1, s2]),
    });
    d.vis2.push(SquaredVisibility {
        time: Some(t1),
        int_time: 30.0,
        vis2data: vec![0.25],
        vis2err: vec![0.02],
        flag: vec![true],
        ucoord: -40.0,
        vcoord: 7.0,
        refs: Refs::new(w1, betelgeuse).with_array(vlti, [s2, s3]),
    });
    d.vis2.push(SquaredVisibility {
        time: Some(t1),
        int_time: 30.0,
        vis2data: vec![0.5, 0.4, 0.3],
        vis2err: vec![0.02; 3],
        flag: vec![false, false, true],
        ucoord: 5.0,
        vcoord: 60.0,
        refs: Refs::new(w3, betelgeuse).with_array(vlti, [s1, s3]),
    });

    d.t3.push(ClosurePhase {
        time: Some(t1),
        int_time: 30.0,
        t3amp: vec![0.1, 0.2, 0.3],
        t3amperr: vec![0.01; 3],
        t3phi: vec![-170.0, 5.0, 179.5],
        t3phierr: vec![2.0; 3],
        flag: vec![false; 3],
        u1coord: 20.0,
        v1coord: -12.5,
        u2coord: 30.0,
        v2coord: 10.0,
        refs: Refs::new(w3, vega).with_array(vlti, [s1, s2, s3]),
    });
    d
}
