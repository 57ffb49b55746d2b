/*!
Angles in degrees and their sexagesimal renderings.
 */

use std::fmt::Display;

/// An angle \[degrees\]. OIFITS stores target positions (and the derived array
/// latitudes and longitudes) in degrees, so that's what we keep.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Angle(pub f64);

impl Angle {
    pub fn from_degrees(degrees: f64) -> Angle {
        Angle(degrees)
    }

    pub fn from_radians(radians: f64) -> Angle {
        Angle(radians.to_degrees())
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Render as "degrees minutes seconds", e.g. `+25:30:22.55`. Useful for
    /// declinations and latitudes.
    pub fn as_dms(self) -> String {
        let (sign, angle) = if self.0 < 0.0 {
            ('-', -self.0)
        } else {
            ('+', self.0)
        };
        let (d, m, s) = split_sexagesimal(angle);
        format!("{sign}{d:02}:{m:02}:{s:05.2}")
    }

    /// Render as "hours minutes seconds", e.g. `05:12:17.21`. Useful for right
    /// ascensions.
    pub fn as_hms(self) -> String {
        let (h, m, s) = split_sexagesimal(self.0 * 24.0 / 360.0);
        format!("{h:02}:{m:02}:{s:05.2}")
    }
}

impl From<f64> for Angle {
    fn from(degrees: f64) -> Self {
        Angle(degrees)
    }
}

impl Display for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} degrees", self.0)
    }
}

/// Split a non-negative value into whole units, whole minutes and (fractional)
/// seconds.
fn split_sexagesimal(value: f64) -> (u64, u64, f64) {
    let whole = value.floor();
    let minutes = ((value - whole) * 60.0).floor();
    let seconds = (value - whole - minutes / 60.0) * 3600.0;
    (whole as u64, minutes as u64, seconds)
}
