//! Helper functions around time.
//!
//! Measurement tables store a `DATE-OBS` header (the zero-point of the table)
//! and, per row, a `TIME` offset from it \[seconds\] and an `MJD`. Both are
//! UTC quantities, so all arithmetic here is done on the UTC scale; leap
//! seconds never appear in `TIME` or `MJD`.

use hifitime::{Duration, Epoch, Unit};

use crate::constants::REF_DATE;

/// Midnight of the date that every written table uses as its `DATE-OBS`.
pub(crate) fn ref_epoch() -> Epoch {
    let (y, m, d) = REF_DATE;
    Epoch::from_gregorian_utc_at_midnight(y, m, d)
}

/// Format the date part of an [`Epoch`] as `YYYY-MM-DD`.
pub fn format_date(e: Epoch) -> String {
    let (year, month, day, _, _, _, _) = e.to_gregorian_utc();
    format!("{year}-{month:02}-{day:02}")
}

/// Parse a `DATE-OBS` value. Both `YYYY-MM-DD` and `YYYY-MM-DDThh:mm:ss[.s]`
/// are accepted; anything else gives `None`.
pub fn parse_date_obs(s: &str) -> Option<Epoch> {
    let s = s.trim();
    // hifitime slices by character position.
    if s.is_empty() || !s.is_ascii() || !s.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    // hifitime reads at most nanoseconds.
    let s = match s.find('.') {
        Some(i) if s.len() > i + 10 => &s[..i + 10],
        _ => s,
    };
    if s.contains('T') {
        Epoch::from_gregorian_str(s).ok()
    } else {
        Epoch::from_gregorian_str(&format!("{s}T00:00:00")).ok()
    }
}

/// Recover a measurement's timestamp from a table's `DATE-OBS` zero-point and
/// a row's `TIME` and `MJD` values.
///
/// `TIME` is used when it is finite and non-zero and the zero-point is
/// usable. Otherwise a finite, positive `MJD` is used. A row with neither
/// has no timestamp.
pub fn row_timestamp(date_obs: Option<Epoch>, time: f64, mjd: f64) -> Option<Epoch> {
    let timestamp = match date_obs {
        Some(zero) if time.is_finite() && time != 0.0 => {
            Epoch::from_utc_duration(zero.to_utc_duration() + Duration::from_seconds(time))
        }
        _ if mjd.is_finite() && mjd > 0.0 => Epoch::from_mjd_utc(mjd),
        _ => return None,
    };
    Some(timestamp.round(Duration::from_f64(1.0, Unit::Microsecond)))
}

/// The `TIME` and `MJD` values to write for a measurement. Absent timestamps
/// are written as NaN, the floating-point null.
pub fn time_and_mjd(timestamp: Option<Epoch>) -> (f64, f64) {
    match timestamp {
        Some(e) => (
            (e.to_utc_duration() - ref_epoch().to_utc_duration()).to_seconds(),
            e.to_mjd_utc_days(),
        ),
        None => (f64::NAN, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_parse_date_obs() {
        assert_eq!(parse_date_obs("2000-01-01"), Some(ref_epoch()));
        assert_eq!(
            parse_date_obs(" 2004-02-29T12:30:15.5 "),
            Some(Epoch::from_gregorian_utc(2004, 2, 29, 12, 30, 15, 500_000_000))
        );
        assert_eq!(
            parse_date_obs("2020-06-01T03:00:00"),
            Some(Epoch::from_gregorian_utc_hms(2020, 6, 1, 3, 0, 0))
        );
        assert_eq!(
            parse_date_obs("2004-02-29T12:30:15.50000000001"),
            Some(Epoch::from_gregorian_utc(2004, 2, 29, 12, 30, 15, 500_000_000))
        );
        assert_eq!(parse_date_obs("2004-13-01"), None);
        assert_eq!(parse_date_obs("yesterday"), None);
        assert_eq!(parse_date_obs("2004-01-01é"), None);
        assert_eq!(parse_date_obs(""), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(ref_epoch()), "2000-01-01");
        assert_eq!(
            format_date(Epoch::from_gregorian_utc(2019, 7, 4, 23, 59, 59, 0)),
            "2019-07-04"
        );
    }

    #[test]
    fn test_time_and_mjd() {
        let (time, mjd) = time_and_mjd(Some(ref_epoch()));
        assert_abs_diff_eq!(time, 0.0);
        assert_abs_diff_eq!(mjd, 51544.0, epsilon = 1e-9);

        let e = Epoch::from_gregorian_utc(2000, 1, 2, 6, 0, 0, 0);
        let (time, mjd) = time_and_mjd(Some(e));
        assert_abs_diff_eq!(time, 108_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mjd, 51545.25, epsilon = 1e-9);

        let (time, mjd) = time_and_mjd(None);
        assert!(time.is_nan());
        assert!(mjd.is_nan());
    }

    #[test]
    fn leap_seconds_are_not_counted() {
        // Five leap seconds were inserted between these dates.
        let e = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let (time, mjd) = time_and_mjd(Some(e));
        assert_abs_diff_eq!(time, 7305.0 * 86_400.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mjd, 58849.0, epsilon = 1e-9);

        let e = Epoch::from_gregorian_utc_hms(2020, 6, 1, 3, 0, 0);
        let (time, mjd) = time_and_mjd(Some(e));
        assert_abs_diff_eq!(mjd, 59001.125, epsilon = 1e-9);
        assert_eq!(row_timestamp(Some(ref_epoch()), time, mjd), Some(e));
    }

    #[test]
    fn test_row_timestamp() {
        let e = Epoch::from_gregorian_utc(2012, 3, 4, 5, 6, 7, 0);
        let (time, mjd) = time_and_mjd(Some(e));
        assert_eq!(row_timestamp(Some(ref_epoch()), time, mjd), Some(e));
        // Without a usable zero-point, the MJD is used.
        let from_mjd = row_timestamp(None, time, mjd).unwrap();
        assert_abs_diff_eq!((from_mjd - e).to_seconds(), 0.0, epsilon = 1e-5);
        // Zero TIME falls back to MJD.
        let from_mjd = row_timestamp(Some(ref_epoch()), 0.0, mjd).unwrap();
        assert_abs_diff_eq!((from_mjd - e).to_seconds(), 0.0, epsilon = 1e-5);

        // A file from another writer with a zero TIME column and a known MJD.
        let from_mjd = row_timestamp(Some(ref_epoch()), 0.0, 59001.125).unwrap();
        let expected = Epoch::from_gregorian_utc_hms(2020, 6, 1, 3, 0, 0);
        assert_abs_diff_eq!((from_mjd - expected).to_seconds(), 0.0, epsilon = 1e-5);

        assert_eq!(row_timestamp(Some(ref_epoch()), f64::NAN, f64::NAN), None);
        assert_eq!(row_timestamp(Some(ref_epoch()), 0.0, 0.0), None);
        assert_eq!(row_timestamp(None, 10.0, f64::NAN), None);
    }
}
