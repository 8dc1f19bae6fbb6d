//! GeoTIFF reader built on the `tiff` decoder.
//!
//! Bounds come from the GeoTIFF model tags:
//! - `ModelTiepointTag` + `ModelPixelScaleTag` (the common north-up layout)
//! - `ModelTransformationTag` without rotation terms
//!
//! A TIFF with neither is treated as ungeoreferenced and gets pixel-unit
//! bounds.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::{Band, RasterHeader, RasterReader, bounds_from_edges, ensure_first_band};
use crate::error::SourceReadError;

/// Reads single-band GeoTIFF elevation rasters.
#[derive(Debug, Clone)]
pub struct GeoTiffReader {
    path: PathBuf,
}

/// Affine mapping from pixel corners to model coordinates, north-up only.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GeoTransform {
    origin_x: f64,
    origin_y: f64,
    pixel_width: f64,
    /// Positive; rows advance southwards.
    pixel_height: f64,
}

impl GeoTiffReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn decoder(&self) -> Result<Decoder<BufReader<File>>, SourceReadError> {
        let file = File::open(&self.path).map_err(|source| SourceReadError::Open {
            path: self.path.clone(),
            source,
        })?;
        Decoder::new(BufReader::new(file)).map_err(|e| self.decode_error(e))
    }

    fn decode_error(&self, err: impl std::fmt::Display) -> SourceReadError {
        SourceReadError::decode(self.path.clone(), err.to_string())
    }

    fn dimensions(
        &self,
        decoder: &mut Decoder<BufReader<File>>,
    ) -> Result<(usize, usize), SourceReadError> {
        let (width, height) = decoder.dimensions().map_err(|e| self.decode_error(e))?;
        Ok((width as usize, height as usize))
    }

    fn f64_tag(
        &self,
        decoder: &mut Decoder<BufReader<File>>,
        tag: Tag,
    ) -> Result<Option<Vec<f64>>, SourceReadError> {
        let value = decoder.find_tag(tag).map_err(|e| self.decode_error(e))?;
        value
            .map(|v| v.into_f64_vec().map_err(|e| self.decode_error(e)))
            .transpose()
    }

    fn geo_transform(
        &self,
        decoder: &mut Decoder<BufReader<File>>,
    ) -> Result<Option<GeoTransform>, SourceReadError> {
        let tiepoint = self.f64_tag(decoder, Tag::ModelTiepointTag)?;
        let scale = self.f64_tag(decoder, Tag::ModelPixelScaleTag)?;
        let matrix = self.f64_tag(decoder, Tag::ModelTransformationTag)?;

        match (tiepoint, scale, matrix) {
            (Some(tiepoint), Some(scale), _) => {
                if tiepoint.len() < 6 || scale.len() < 2 {
                    return Err(self.decode_error("truncated tie point or pixel scale tag"));
                }
                Ok(Some(GeoTransform::from_tiepoint(&tiepoint, &scale)))
            }
            (_, _, Some(matrix)) => {
                if matrix.len() < 16 {
                    return Err(self.decode_error("truncated model transformation tag"));
                }
                GeoTransform::from_matrix(&matrix)
                    .map(Some)
                    .ok_or_else(|| self.decode_error("rotated or sheared rasters are not supported"))
            }
            _ => Ok(None),
        }
    }
}

impl GeoTransform {
    /// Tie point `(i, j, k, x, y, z)` anchors pixel `(i, j)` at model `(x, y)`.
    fn from_tiepoint(tiepoint: &[f64], scale: &[f64]) -> Self {
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);
        Self {
            origin_x: x - i * sx,
            origin_y: y + j * sy,
            pixel_width: sx,
            pixel_height: sy,
        }
    }

    /// Row-major 4x4 matrix; only the axis-aligned case is accepted.
    fn from_matrix(m: &[f64]) -> Option<Self> {
        if m[1] != 0.0 || m[4] != 0.0 {
            return None;
        }
        Some(Self {
            origin_x: m[3],
            origin_y: m[7],
            pixel_width: m[0],
            pixel_height: -m[5],
        })
    }

    /// Returns `(left, right, top, bottom)`.
    fn edges(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let left = self.origin_x;
        let top = self.origin_y;
        let right = left + self.pixel_width * width as f64;
        let bottom = top - self.pixel_height * height as f64;
        (left, right, top, bottom)
    }
}

/// Number of interleaved samples per pixel for a decoded colour type.
fn samples_per_pixel(color: ColorType) -> usize {
    match color {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) | ColorType::CMYK(_) => 4,
        _ => 1,
    }
}

fn widen(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
    }
}

impl RasterReader for GeoTiffReader {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_header(&self) -> Result<RasterHeader, SourceReadError> {
        let mut decoder = self.decoder()?;
        let (width, height) = self.dimensions(&mut decoder)?;

        let (left, right, top, bottom) = match self.geo_transform(&mut decoder)? {
            Some(transform) => transform.edges(width, height),
            None => {
                tracing::warn!(
                    "{} has no georeferencing tags, using pixel units",
                    self.path.display()
                );
                (0.0, width as f64, height as f64, 0.0)
            }
        };

        Ok(RasterHeader {
            width,
            height,
            bounds: bounds_from_edges(&self.source_name(), left, right, top, bottom)?,
        })
    }

    fn read_band(&self, band: usize) -> Result<Band, SourceReadError> {
        ensure_first_band(self.source_name(), band)?;

        let mut decoder = self.decoder()?;
        let (width, height) = self.dimensions(&mut decoder)?;
        let color = decoder.colortype().map_err(|e| self.decode_error(e))?;
        let samples = samples_per_pixel(color);

        let raw = widen(decoder.read_image().map_err(|e| self.decode_error(e))?);
        let values: Vec<f64> = if samples == 1 {
            raw
        } else {
            tracing::debug!("{:?} raster, keeping the first of {} samples", color, samples);
            raw.into_iter().step_by(samples).collect()
        };

        if values.len() != width * height {
            return Err(self.decode_error(format!(
                "decoded {} cells for a {width}x{height} raster",
                values.len()
            )));
        }

        Ok(Band {
            width,
            height,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{TiffEncoder, colortype};

    fn write_dem(path: &Path, width: u32, height: u32, values: &[f32], georef: bool) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();
        if georef {
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &[30.0f64, 30.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(
                    Tag::ModelTiepointTag,
                    &[0.0f64, 0.0, 0.0, 500_000.0, 4_100_000.0, 0.0][..],
                )
                .unwrap();
        }
        image.write_data(values).unwrap();
    }

    #[test]
    fn test_tiepoint_transform() {
        let transform = GeoTransform::from_tiepoint(&[0.0, 0.0, 0.0, 10.0, 50.0, 0.0], &[0.5, 0.25, 0.0]);
        assert_eq!(transform.edges(4, 8), (10.0, 12.0, 50.0, 48.0));
    }

    #[test]
    fn test_tiepoint_offset_from_origin() {
        // Tie point anchored at pixel (2, 1) rather than the corner
        let transform = GeoTransform::from_tiepoint(&[2.0, 1.0, 0.0, 20.0, 40.0, 0.0], &[1.0, 1.0, 0.0]);
        assert_eq!(transform.origin_x, 18.0);
        assert_eq!(transform.origin_y, 41.0);
    }

    #[test]
    fn test_matrix_transform() {
        let matrix = [
            2.0, 0.0, 0.0, 100.0, //
            0.0, -3.0, 0.0, 200.0, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let transform = GeoTransform::from_matrix(&matrix).unwrap();
        assert_eq!(transform.edges(5, 10), (100.0, 110.0, 200.0, 170.0));
    }

    #[test]
    fn test_rotated_matrix_rejected() {
        let mut matrix = [0.0; 16];
        matrix[0] = 1.0;
        matrix[1] = 0.2;
        matrix[5] = -1.0;
        assert!(GeoTransform::from_matrix(&matrix).is_none());
    }

    #[test]
    fn test_read_georeferenced_tiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        write_dem(&path, 3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], true);

        let reader = GeoTiffReader::new(&path);
        let header = reader.read_header().unwrap();
        assert_eq!((header.width, header.height), (3, 2));
        assert_eq!(header.bounds.min().x, 500_000.0);
        assert_eq!(header.bounds.max().x, 500_090.0);
        assert_eq!(header.bounds.max().y, 4_100_000.0);
        assert_eq!(header.bounds.min().y, 4_099_940.0);

        let band = reader.read_band(1).unwrap();
        assert_eq!(band.values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ungeoreferenced_tiff_uses_pixel_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        write_dem(&path, 2, 2, &[0.0, 0.0, 0.0, 0.0], false);

        let header = GeoTiffReader::new(&path).read_header().unwrap();
        assert_eq!(header.bounds.width(), 2.0);
        assert_eq!(header.bounds.height(), 2.0);
    }

    #[test]
    fn test_second_band_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        write_dem(&path, 1, 1, &[7.0], true);

        let err = GeoTiffReader::new(&path).read_band(2).unwrap_err();
        assert!(matches!(err, SourceReadError::MissingBand { band: 2, .. }));
    }

    #[test]
    fn test_not_a_tiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.tif");
        std::fs::write(&path, b"definitely not a tiff").unwrap();

        let err = GeoTiffReader::new(&path).read_header().unwrap_err();
        assert!(matches!(err, SourceReadError::Decode { .. }));
    }
}
