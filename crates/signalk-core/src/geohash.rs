//! Geohash encoding of WGS84 positions.
//!
//! A geohash interleaves longitude and latitude bisection bits and writes
//! them five at a time in a base-32 alphabet. Longer hashes are more
//! precise; 12 characters resolve to a few centimetres.
//!
//! [`encode`] picks the shortest hash that decodes back to the input
//! coordinates (decoded values are rounded to the precision the cell can
//! express), so round numbers produce short hashes.

use thiserror::Error;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest hash produced by [`encode`].
pub const MAX_PRECISION: usize = 12;

/// Errors from geohash encoding and decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeohashError {
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid geohash character {0:?}")]
    InvalidCharacter(char),

    #[error("Empty geohash")]
    Empty,
}

/// Bounding box of a geohash cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Bounds {
    fn world() -> Self {
        Self {
            lat_min: -90.0,
            lat_max: 90.0,
            lon_min: -180.0,
            lon_max: 180.0,
        }
    }
}

/// Encode a position with the shortest hash that round-trips it.
pub fn encode(latitude: f64, longitude: f64) -> Result<String, GeohashError> {
    for precision in 1..=MAX_PRECISION {
        let hash = encode_with_precision(latitude, longitude, precision)?;
        if decode(&hash)? == (latitude, longitude) {
            return Ok(hash);
        }
    }
    encode_with_precision(latitude, longitude, MAX_PRECISION)
}

/// Encode a position with an explicit number of characters.
pub fn encode_with_precision(
    latitude: f64,
    longitude: f64,
    precision: usize,
) -> Result<String, GeohashError> {
    if !latitude.is_finite()
        || !longitude.is_finite()
        || !(-90.0..=90.0).contains(&latitude)
        || !(-180.0..=180.0).contains(&longitude)
    {
        return Err(GeohashError::InvalidCoordinate {
            latitude,
            longitude,
        });
    }

    let mut bounds = Bounds::world();
    let mut hash = String::with_capacity(precision);
    let mut idx = 0usize;
    let mut bit = 0;
    let mut even_bit = true;

    while hash.len() < precision {
        if even_bit {
            let mid = (bounds.lon_min + bounds.lon_max) / 2.0;
            if longitude >= mid {
                idx = idx * 2 + 1;
                bounds.lon_min = mid;
            } else {
                idx *= 2;
                bounds.lon_max = mid;
            }
        } else {
            let mid = (bounds.lat_min + bounds.lat_max) / 2.0;
            if latitude >= mid {
                idx = idx * 2 + 1;
                bounds.lat_min = mid;
            } else {
                idx *= 2;
                bounds.lat_max = mid;
            }
        }
        even_bit = !even_bit;

        bit += 1;
        if bit == 5 {
            hash.push(BASE32[idx] as char);
            bit = 0;
            idx = 0;
        }
    }

    Ok(hash)
}

/// Bounding box of the cell named by `hash`.
pub fn bounds(hash: &str) -> Result<Bounds, GeohashError> {
    if hash.is_empty() {
        return Err(GeohashError::Empty);
    }

    let mut bounds = Bounds::world();
    let mut even_bit = true;

    for c in hash.chars() {
        let idx = BASE32
            .iter()
            .position(|&b| b as char == c.to_ascii_lowercase())
            .ok_or(GeohashError::InvalidCharacter(c))?;

        for n in (0..5).rev() {
            let bit = (idx >> n) & 1;
            if even_bit {
                let mid = (bounds.lon_min + bounds.lon_max) / 2.0;
                if bit == 1 {
                    bounds.lon_min = mid;
                } else {
                    bounds.lon_max = mid;
                }
            } else {
                let mid = (bounds.lat_min + bounds.lat_max) / 2.0;
                if bit == 1 {
                    bounds.lat_min = mid;
                } else {
                    bounds.lat_max = mid;
                }
            }
            even_bit = !even_bit;
        }
    }

    Ok(bounds)
}

/// Decode a hash to the centre of its cell as `(latitude, longitude)`.
///
/// Each coordinate is rounded to the number of decimals the cell size
/// justifies.
pub fn decode(hash: &str) -> Result<(f64, f64), GeohashError> {
    let b = bounds(hash)?;
    let lat = round_to_cell((b.lat_min + b.lat_max) / 2.0, b.lat_max - b.lat_min);
    let lon = round_to_cell((b.lon_min + b.lon_max) / 2.0, b.lon_max - b.lon_min);
    Ok((lat, lon))
}

fn round_to_cell(value: f64, extent: f64) -> f64 {
    let places = (2.0 - extent.log10()).floor().max(0.0) as i32;
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
