/*!
Useful constants.

All values are those mandated (or assumed) by the OIFITS v1 standard.
 */

/// The only table revision this crate reads and writes.
pub const OI_REVN: i64 = 1;

/// Radius of the spherical Earth used to derive array altitudes \[metres\].
pub const EARTH_RADIUS: f64 = 6_378_100.0;

/// The `DATE-OBS` zero-point written into every measurement table. Per-row
/// `TIME` values are offsets from midnight of this date.
pub const REF_DATE: (i32, u8, u8) = (2000, 1, 1);

/// Written into `STA_INDEX` when a measurement has no station association.
pub const NO_STATION: i16 = -1;

/// Widths of the fixed-width string columns.
pub const NAME_WIDTH: usize = 16;
pub const VEL_WIDTH: usize = 8;

/// Section (extension) names.
pub const PRIMARY: &str = "PRIMARY";
pub const OI_WAVELENGTH: &str = "OI_WAVELENGTH";
pub const OI_TARGET: &str = "OI_TARGET";
pub const OI_ARRAY: &str = "OI_ARRAY";
pub const OI_VIS: &str = "OI_VIS";
pub const OI_VIS2: &str = "OI_VIS2";
pub const OI_T3: &str = "OI_T3";
