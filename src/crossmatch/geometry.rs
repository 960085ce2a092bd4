//! Flat-sky angular geometry.

/// Angular distance between two points on the unit sphere, in degrees.
///
/// Small-angle flat-sky approximation: the right ascension offset is scaled
/// by the cosine of the mean declination and combined with the declination
/// offset by `hypot`. The store-side spatial index is expected to overselect;
/// this function is the authoritative post-filter applied to every candidate
/// before it becomes a neighbor.
pub fn angular_distance_deg(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let d_dec = dec1 - dec2;
    let d_ra = (ra1 - ra2) * ((dec1 + dec2) / 2.0).to_radians().cos();
    d_dec.hypot(d_ra)
}

#[cfg(test)]
mod test {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn coincident_points_have_zero_distance() {
        assert!(angular_distance_deg(10.0, 20.0, 10.0, 20.0).abs() < EPSILON);
    }

    #[test]
    fn declination_offset_passes_through() {
        assert!((angular_distance_deg(10.0, 20.0, 10.0, 21.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn ra_offset_at_equator_is_unscaled() {
        assert!((angular_distance_deg(10.0, 0.0, 11.0, 0.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn ra_offset_shrinks_with_declination() {
        // cos(60 deg) = 0.5
        assert!((angular_distance_deg(10.0, 60.0, 11.0, 60.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let d1 = angular_distance_deg(10.0, 20.0, 10.3, 20.4);
        let d2 = angular_distance_deg(10.3, 20.4, 10.0, 20.0);
        assert!((d1 - d2).abs() < EPSILON);
    }
}
