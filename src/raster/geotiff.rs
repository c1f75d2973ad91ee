use crate::domain::ElevationGrid;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

/// GDAL stores the raster's no-data value as ASCII in this private tag
const GDAL_NODATA_TAG: u16 = 42113;

/// Read the first band of a (Geo)TIFF into an elevation grid.
///
/// Samples equal to the GDAL no-data value are replaced by NaN so they are
/// treated like any other missing sample downstream.
pub fn read_elevation(path: &Path) -> Result<ElevationGrid> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open raster: {}", path.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode TIFF header: {}", path.display()))?;

    let (width, height) = decoder
        .dimensions()
        .context("Failed to read raster dimensions")?;
    let nodata = read_nodata(&mut decoder);

    let samples = match decoder.read_image().context("Failed to read raster data")? {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => bail!("Unsupported raster sample format: {}", path.display()),
    };

    grid_from_samples(width as usize, height as usize, samples, nodata)
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA_TAG))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok())
}

/// Keep the first sample of each pixel and mask no-data values
fn grid_from_samples(
    width: usize,
    height: usize,
    samples: Vec<f64>,
    nodata: Option<f64>,
) -> Result<ElevationGrid> {
    let pixels = width * height;
    if pixels == 0 {
        bail!("Raster is empty ({}x{})", width, height);
    }
    if samples.len() % pixels != 0 {
        bail!(
            "Raster has {} samples, not a multiple of {}x{}",
            samples.len(),
            width,
            height
        );
    }

    let samples_per_pixel = samples.len() / pixels;
    let values: Vec<f64> = samples
        .into_iter()
        .step_by(samples_per_pixel)
        .map(|v| match nodata {
            Some(nd) if v == nd => f64::NAN,
            _ => v,
        })
        .collect();

    ElevationGrid::new(height, width, values)
        .ok_or_else(|| anyhow::anyhow!("Raster size mismatch for {}x{}", width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tiff::encoder::{TiffEncoder, colortype};

    #[test]
    fn test_read_float_tiff() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elevation.tif");

        let data: Vec<f32> = (0..12).map(|v| v as f32 * 10.0).collect();
        let file = File::create(&path).unwrap();
        TiffEncoder::new(file)
            .unwrap()
            .write_image::<colortype::Gray32Float>(4, 3, &data)
            .unwrap();

        let grid = read_elevation(&path).unwrap();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.get(1, 2), 60.0);
    }

    #[test]
    fn test_read_i16_tiff() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("srtm.tif");

        let data: Vec<i16> = vec![-5, 0, 120, 3000];
        let file = File::create(&path).unwrap();
        TiffEncoder::new(file)
            .unwrap()
            .write_image::<colortype::GrayI16>(2, 2, &data)
            .unwrap();

        let grid = read_elevation(&path).unwrap();
        assert_eq!(grid.values(), &[-5.0, 0.0, 120.0, 3000.0]);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_elevation(Path::new("/nonexistent/elevation.tif")).is_err());
    }

    #[test]
    fn test_read_garbage_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tif");
        std::fs::write(&path, b"not a tiff").unwrap();
        assert!(read_elevation(&path).is_err());
    }

    #[test]
    fn test_grid_from_samples_masks_nodata() {
        let grid = grid_from_samples(2, 1, vec![-32768.0, 5.0], Some(-32768.0)).unwrap();
        assert!(grid.values()[0].is_nan());
        assert_eq!(grid.values()[1], 5.0);
    }

    #[test]
    fn test_grid_from_samples_takes_first_band() {
        // Two pixels, three samples each
        let grid = grid_from_samples(2, 1, vec![1.0, 9.0, 9.0, 2.0, 9.0, 9.0], None).unwrap();
        assert_eq!(grid.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_grid_from_samples_rejects_mismatch() {
        assert!(grid_from_samples(2, 2, vec![1.0; 5], None).is_err());
        assert!(grid_from_samples(0, 2, vec![], None).is_err());
    }
}
