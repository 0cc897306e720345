use ndarray::{Array2, Zip};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Fill value the swath tool writes outside the swath.
pub const SWATH_NODATA: f64 = -28672.0;

/// Byte value used for masked pixels in the merged product.
pub const RGB_NODATA: u8 = 0;

#[inline]
fn is_valid(v: f64, nodata: f64) -> bool {
    v.is_finite() && v != nodata
}

/// Min/max over every non-nodata sample of all bands, `None` if nothing is valid.
pub fn valid_range(bands: &[Array2<f64>], nodata: f64) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for band in bands {
        for &v in band.iter() {
            if is_valid(v, nodata) {
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
        }
    }
    if min.is_finite() && max.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

/// Linear stretch of a band stack to 0..=255 using one shared min/max.
///
/// Nodata pixels are excluded from the statistics and written as
/// [`RGB_NODATA`]. A constant stack maps to zero.
pub fn rescale_to_u8(bands: &[Array2<f64>], nodata: f64) -> Result<Vec<Array2<u8>>> {
    let Some(first) = bands.first() else {
        return Err(Error::Processing("no bands to rescale".to_string()));
    };
    let shape = first.dim();
    if let Some(bad) = bands.iter().find(|b| b.dim() != shape) {
        return Err(Error::Processing(format!(
            "band shapes differ: {:?} vs {:?}",
            shape,
            bad.dim()
        )));
    }

    let Some((min, max)) = valid_range(bands, nodata) else {
        info!("All samples are nodata; writing an empty RGB image");
        return Ok(bands.iter().map(|_| Array2::from_elem(shape, RGB_NODATA)).collect());
    };
    let span = max - min;
    let scale = if span > 0.0 { 255.0 / span } else { 0.0 };
    debug!("Rescaling range [{}, {}] to 0..255", min, max);

    Ok(bands
        .iter()
        .map(|band| {
            let mut out = Array2::<u8>::zeros(shape);
            Zip::from(band).and(&mut out).for_each(|&v, o| {
                *o = if is_valid(v, nodata) {
                    ((v - min) * scale).round().clamp(0.0, 255.0) as u8
                } else {
                    RGB_NODATA
                };
            });
            out
        })
        .collect())
}
