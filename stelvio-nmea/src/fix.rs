//! Parsed GPS fix record

/// UTC time of day as carried in RMC/GGA sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

/// UTC date as carried in RMC sentences. Year is full (2000-based wire
/// encoding expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

/// Latest parsed GPS state, overwritten in place by each accepted
/// RMC/GGA sentence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsFix {
    pub time: UtcTime,
    pub date: UtcDate,

    /// Degrees, positive north
    pub latitude: f32,
    /// Degrees, positive east
    pub longitude: f32,
    /// Metres above mean sea level (GGA)
    pub altitude_msl: f32,

    /// Speed over ground, knots (RMC)
    pub speed_knots: f32,
    /// Speed over ground, km/h (derived)
    pub speed_kmh: f32,
    /// Course over ground, degrees true (RMC)
    pub course_deg: f32,

    /// GGA fix-quality code: 0 = invalid, >0 = valid
    pub fix_quality: u8,
    /// Satellites used in the fix (GGA)
    pub satellites: u8,
    /// Overall validity: RMC's A/V flag, falling back to
    /// `fix_quality > 0` when RMC has not spoken
    pub fix_valid: bool,

    pub seen_rmc: bool,
    pub seen_gga: bool,
}
