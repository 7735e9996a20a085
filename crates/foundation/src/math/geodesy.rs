use super::{Ecef, modulo};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
/// WGS84 second eccentricity squared.
pub const WGS84_EP2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
/// Mean radius of the WGS84 ellipsoid, used by the spherical fallback.
pub const WGS84_MEAN_RADIUS: f64 = (2.0 * WGS84_A + WGS84_B) / 3.0;

const VINCENTY_MAX_ITERATIONS: usize = 200;
const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Geodetic coordinates in radians and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat_rad,
            lon_rad,
            alt_m,
        }
    }

    pub fn from_degrees(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self::new(lat_deg.to_radians(), lon_deg.to_radians(), alt_m)
    }
}

pub fn geodetic_to_ecef(geo: Geodetic) -> Ecef {
    let sin_lat = geo.lat_rad.sin();
    let cos_lat = geo.lat_rad.cos();
    let sin_lon = geo.lon_rad.sin();
    let cos_lon = geo.lon_rad.cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let x = (n + geo.alt_m) * cos_lat * cos_lon;
    let y = (n + geo.alt_m) * cos_lat * sin_lon;
    let z = (n * (1.0 - WGS84_E2) + geo.alt_m) * sin_lat;

    Ecef::new(x, y, z)
}

pub fn ecef_to_geodetic(ecef: Ecef) -> Geodetic {
    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
    let lon = ecef.y.atan2(ecef.x);

    let theta = (ecef.z * WGS84_A).atan2(p * WGS84_B);
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();

    let lat = (ecef.z + WGS84_EP2 * WGS84_B * sin_theta * sin_theta * sin_theta)
        .atan2(p - WGS84_E2 * WGS84_A * cos_theta * cos_theta * cos_theta);

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    // Close to the poles `p / cos(lat)` degenerates; use the polar form there.
    let alt = if lat.cos().abs() > 1e-9 {
        p / lat.cos() - n
    } else {
        ecef.z.abs() - WGS84_B
    };

    Geodetic::new(lat, lon, alt)
}

/// Solution of the inverse geodesic problem.
///
/// Azimuths are in degrees clockwise from north; `azimuth2_deg` is the forward
/// azimuth at the second point (the direction of travel on arrival).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeodesicInverse {
    pub distance_m: f64,
    pub azimuth1_deg: f64,
    pub azimuth2_deg: f64,
    /// Arc length on the auxiliary sphere (degrees).
    pub arc_deg: f64,
}

/// Solution of the direct geodesic problem.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeodesicDirect {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Forward azimuth at the destination (degrees).
    pub azimuth2_deg: f64,
}

fn wrap_lon_deg(lon: f64) -> f64 {
    modulo(lon + 180.0, 360.0) - 180.0
}

/// Distance and azimuths between two points on the WGS84 ellipsoid.
///
/// Uses Vincenty's iteration; nearly antipodal pairs where it fails to
/// converge are answered on the mean sphere instead.
pub fn geodesic_inverse(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> GeodesicInverse {
    vincenty_inverse(lat1_deg, lon1_deg, lat2_deg, lon2_deg)
        .unwrap_or_else(|| spherical_inverse(lat1_deg, lon1_deg, lat2_deg, lon2_deg))
}

fn vincenty_inverse(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> Option<GeodesicInverse> {
    let f = WGS84_F;
    let l = wrap_lon_deg(lon2_deg - lon1_deg).to_radians();
    let u1 = ((1.0 - f) * lat1_deg.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * lat2_deg.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;
    let (mut sin_sigma, mut cos_sigma, mut sigma) = (0.0, 1.0, 0.0);
    let (mut cos_sq_alpha, mut cos_2sigma_m) = (1.0, 0.0);
    let (mut sin_lambda, mut cos_lambda) = (0.0, 1.0);

    for _ in 0..VINCENTY_MAX_ITERATIONS {
        (sin_lambda, cos_lambda) = lambda.sin_cos();
        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        sin_sigma = (t1 * t1 + t2 * t2).sqrt();
        if sin_sigma == 0.0 {
            return Some(GeodesicInverse {
                distance_m: 0.0,
                azimuth1_deg: 0.0,
                azimuth2_deg: 0.0,
                arc_deg: 0.0,
            });
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos_sq_alpha == 0.
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        if !lambda.is_finite() || lambda.abs() > std::f64::consts::PI {
            return None;
        }
        if (lambda - previous).abs() < VINCENTY_TOLERANCE {
            converged = true;
            break;
        }
    }
    if !converged {
        return None;
    }

    let u_sq = cos_sq_alpha * WGS84_EP2;
    let (a_coef, b_coef) = series_coefficients(u_sq);
    let delta_sigma = delta_sigma(b_coef, sin_sigma, cos_sigma, cos_2sigma_m);
    let distance_m = WGS84_B * a_coef * (sigma - delta_sigma);

    let azimuth1 = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
    let azimuth2 = (cos_u1 * sin_lambda).atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda);

    Some(GeodesicInverse {
        distance_m,
        azimuth1_deg: azimuth1.to_degrees(),
        azimuth2_deg: azimuth2.to_degrees(),
        arc_deg: sigma.to_degrees(),
    })
}

fn spherical_inverse(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> GeodesicInverse {
    let (phi1, phi2) = (lat1_deg.to_radians(), lat2_deg.to_radians());
    let dlon = wrap_lon_deg(lon2_deg - lon1_deg).to_radians();
    let (sin_p1, cos_p1) = phi1.sin_cos();
    let (sin_p2, cos_p2) = phi2.sin_cos();
    let (sin_dl, cos_dl) = dlon.sin_cos();

    let y = ((cos_p2 * sin_dl).powi(2) + (cos_p1 * sin_p2 - sin_p1 * cos_p2 * cos_dl).powi(2)).sqrt();
    let x = sin_p1 * sin_p2 + cos_p1 * cos_p2 * cos_dl;
    let sigma = y.atan2(x);

    let azimuth1 = (sin_dl * cos_p2).atan2(cos_p1 * sin_p2 - sin_p1 * cos_p2 * cos_dl);
    let azimuth2 = (sin_dl * cos_p1).atan2(-sin_p1 * cos_p2 + cos_p1 * sin_p2 * cos_dl);

    GeodesicInverse {
        distance_m: WGS84_MEAN_RADIUS * sigma,
        azimuth1_deg: azimuth1.to_degrees(),
        azimuth2_deg: azimuth2.to_degrees(),
        arc_deg: sigma.to_degrees(),
    }
}

/// Destination reached by travelling `distance_m` from a point along an initial azimuth.
pub fn geodesic_direct(lat1_deg: f64, lon1_deg: f64, azimuth1_deg: f64, distance_m: f64) -> GeodesicDirect {
    let f = WGS84_F;
    let (sin_alpha1, cos_alpha1) = azimuth1_deg.to_radians().sin_cos();
    let tan_u1 = (1.0 - f) * lat1_deg.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;
    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * WGS84_EP2;
    let (a_coef, b_coef) = series_coefficients(u_sq);

    let first = distance_m / (WGS84_B * a_coef);
    let mut sigma = first;
    let (mut sin_sigma, mut cos_sigma, mut cos_2sigma_m) = (sigma.sin(), sigma.cos(), 0.0);
    for _ in 0..VINCENTY_MAX_ITERATIONS {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        (sin_sigma, cos_sigma) = sigma.sin_cos();
        let previous = sigma;
        sigma = first + delta_sigma(b_coef, sin_sigma, cos_sigma, cos_2sigma_m);
        if (sigma - previous).abs() < VINCENTY_TOLERANCE {
            break;
        }
    }
    (sin_sigma, cos_sigma) = sigma.sin_cos();
    cos_2sigma_m = (2.0 * sigma1 + sigma).cos();

    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
    let azimuth2 = sin_alpha.atan2(-tmp);

    GeodesicDirect {
        lat_deg: lat2.to_degrees(),
        lon_deg: wrap_lon_deg(lon1_deg + l.to_degrees()),
        azimuth2_deg: azimuth2.to_degrees(),
    }
}

/// Angular distance between two points (degrees of arc).
pub fn geodesic_arc_deg(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    geodesic_inverse(lat1_deg, lon1_deg, lat2_deg, lon2_deg).arc_deg
}

fn series_coefficients(u_sq: f64) -> (f64, f64) {
    let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    (a, b)
}

fn delta_sigma(b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    let c2 = cos_2sigma_m * cos_2sigma_m;
    b * sin_sigma
        * (cos_2sigma_m
            + b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * c2)
                    - b / 6.0 * cos_2sigma_m * (-3.0 + 4.0 * sin_sigma * sin_sigma) * (-3.0 + 4.0 * c2)))
}
