//! ESRI ASCII grid reader.
//!
//! The format is a short `key value` header followed by `nrows` lines of
//! `ncols` values, northernmost row first:
//!
//! ```text
//! ncols        4
//! nrows        3
//! xllcorner    500000.0
//! yllcorner    4100000.0
//! cellsize     30.0
//! NODATA_value -9999
//! 12.0 13.5 ...
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{Band, RasterHeader, RasterReader, bounds_from_edges, ensure_first_band};
use crate::error::SourceReadError;

/// Reads `.asc` elevation grids.
#[derive(Debug, Clone)]
pub struct AsciiGridReader {
    path: PathBuf,
}

/// Whether the lower-left coordinates name the corner or the centre of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Corner,
    Center,
}

#[derive(Debug, Default)]
struct GridHeader {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, Anchor)>,
    yll: Option<(f64, Anchor)>,
    cellsize: Option<f64>,
    dx: Option<f64>,
    dy: Option<f64>,
    nodata: Option<f64>,
}

impl AsciiGridReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> Result<BufReader<File>, SourceReadError> {
        let file = File::open(&self.path).map_err(|source| SourceReadError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(BufReader::new(file))
    }

    fn decode_error(&self, message: impl Into<String>) -> SourceReadError {
        SourceReadError::decode(self.path.clone(), message)
    }

    /// Parses the header and, when `with_values` is set, the cell values.
    fn read_grid(&self, with_values: bool) -> Result<(RasterHeader, Vec<f64>), SourceReadError> {
        let reader = self.open()?;
        let mut header = GridHeader::default();
        let mut values = Vec::new();
        let mut in_header = true;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| self.decode_error(format!("line {}: {e}", line_no + 1)))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Data rows may open with `nan` or `inf`, so a header line is one
            // whose first token is not a number.
            let first_is_number = trimmed
                .split_whitespace()
                .next()
                .is_some_and(|token| token.parse::<f64>().is_ok());
            if in_header && !first_is_number {
                self.parse_header_line(&mut header, trimmed, line_no + 1)?;
                continue;
            }

            in_header = false;
            if !with_values {
                break;
            }
            for token in trimmed.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| {
                    self.decode_error(format!("line {}: invalid cell value {token:?}", line_no + 1))
                })?;
                values.push(value);
            }
        }

        let raster_header = self.resolve_header(&header)?;

        if with_values {
            let expected = raster_header.width * raster_header.height;
            if values.len() != expected {
                return Err(self.decode_error(format!(
                    "expected {expected} cell values, found {}",
                    values.len()
                )));
            }
        }

        Ok((raster_header, values))
    }

    fn parse_header_line(
        &self,
        header: &mut GridHeader,
        line: &str,
        line_no: usize,
    ) -> Result<(), SourceReadError> {
        let mut parts = line.split_whitespace();
        let key = parts.next().unwrap_or_default().to_lowercase();
        let raw = parts
            .next()
            .ok_or_else(|| self.decode_error(format!("line {line_no}: {key} has no value")))?;

        let number = |raw: &str| -> Result<f64, SourceReadError> {
            raw.parse::<f64>()
                .map_err(|_| self.decode_error(format!("line {line_no}: invalid {key} {raw:?}")))
        };
        let count = |raw: &str| -> Result<usize, SourceReadError> {
            raw.parse::<usize>()
                .map_err(|_| self.decode_error(format!("line {line_no}: invalid {key} {raw:?}")))
        };

        match key.as_str() {
            "ncols" => header.ncols = Some(count(raw)?),
            "nrows" => header.nrows = Some(count(raw)?),
            "xllcorner" => header.xll = Some((number(raw)?, Anchor::Corner)),
            "xllcenter" => header.xll = Some((number(raw)?, Anchor::Center)),
            "yllcorner" => header.yll = Some((number(raw)?, Anchor::Corner)),
            "yllcenter" => header.yll = Some((number(raw)?, Anchor::Center)),
            "cellsize" => header.cellsize = Some(number(raw)?),
            "dx" => header.dx = Some(number(raw)?),
            "dy" => header.dy = Some(number(raw)?),
            "nodata_value" => header.nodata = Some(number(raw)?),
            _ => {
                return Err(self.decode_error(format!("line {line_no}: unknown header key {key:?}")));
            }
        }
        Ok(())
    }

    fn resolve_header(&self, header: &GridHeader) -> Result<RasterHeader, SourceReadError> {
        let missing = |key: &str| self.decode_error(format!("missing {key} in header"));

        let width = header.ncols.ok_or_else(|| missing("ncols"))?;
        let height = header.nrows.ok_or_else(|| missing("nrows"))?;
        let (xll, x_anchor) = header.xll.ok_or_else(|| missing("xllcorner"))?;
        let (yll, y_anchor) = header.yll.ok_or_else(|| missing("yllcorner"))?;
        let cell_x = header
            .dx
            .or(header.cellsize)
            .ok_or_else(|| missing("cellsize"))?;
        let cell_y = header
            .dy
            .or(header.cellsize)
            .ok_or_else(|| missing("cellsize"))?;

        if let Some(nodata) = header.nodata {
            tracing::debug!("{} declares NODATA value {}", self.path.display(), nodata);
        }

        let left = match x_anchor {
            Anchor::Corner => xll,
            Anchor::Center => xll - cell_x / 2.0,
        };
        let bottom = match y_anchor {
            Anchor::Corner => yll,
            Anchor::Center => yll - cell_y / 2.0,
        };
        let right = left + cell_x * width as f64;
        let top = bottom + cell_y * height as f64;

        Ok(RasterHeader {
            width,
            height,
            bounds: bounds_from_edges(&self.source_name(), left, right, top, bottom)?,
        })
    }
}

impl RasterReader for AsciiGridReader {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_header(&self) -> Result<RasterHeader, SourceReadError> {
        self.read_grid(false).map(|(header, _)| header)
    }

    fn read_band(&self, band: usize) -> Result<Band, SourceReadError> {
        ensure_first_band(self.source_name(), band)?;
        let (header, values) = self.read_grid(true)?;
        Ok(Band {
            width: header.width,
            height: header.height,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_grid(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_corner_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            &dir,
            "corner.asc",
            "ncols 3\nnrows 2\nxllcorner 100.0\nyllcorner 200.0\ncellsize 10.0\nNODATA_value -9999\n1 2 3\n4 5 6\n",
        );
        let reader = AsciiGridReader::new(&path);

        let header = reader.read_header().unwrap();
        assert_eq!((header.width, header.height), (3, 2));
        assert_eq!(header.bounds.min().x, 100.0);
        assert_eq!(header.bounds.max().x, 130.0);
        assert_eq!(header.bounds.min().y, 200.0);
        assert_eq!(header.bounds.max().y, 220.0);

        let band = reader.read_band(1).unwrap();
        assert_eq!(band.values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(band.value(0, 1), 4.0);
    }

    #[test]
    fn test_read_center_grid_with_dx_dy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            &dir,
            "center.asc",
            "NCOLS 2\nNROWS 2\nXLLCENTER 0.5\nYLLCENTER 1.0\nDX 1.0\nDY 2.0\n7 8\n9 10\n",
        );
        let header = AsciiGridReader::new(&path).read_header().unwrap();

        assert_eq!(header.bounds.min().x, 0.0);
        assert_eq!(header.bounds.max().x, 2.0);
        assert_eq!(header.bounds.min().y, 0.0);
        assert_eq!(header.bounds.max().y, 4.0);
    }

    #[test]
    fn test_values_may_wrap_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            &dir,
            "wrapped.asc",
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n2 3\n4\n",
        );
        let band = AsciiGridReader::new(&path).read_band(1).unwrap();
        assert_eq!(band.values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_data_may_start_with_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            &dir,
            "nan.asc",
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nnan 1\ninf 3\n",
        );
        let band = AsciiGridReader::new(&path).read_band(1).unwrap();
        assert!(band.values[0].is_nan());
        assert_eq!(band.values[1], 1.0);
        assert_eq!(band.values[2], f64::INFINITY);
        assert_eq!(band.values[3], 3.0);
    }

    #[test]
    fn test_unknown_header_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            &dir,
            "bad.asc",
            "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nbogus 3\n5\n",
        );
        let err = AsciiGridReader::new(&path).read_header().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_short_grid_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            &dir,
            "short.asc",
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n3\n",
        );
        let err = AsciiGridReader::new(&path).read_band(1).unwrap_err();
        assert!(matches!(err, SourceReadError::Decode { .. }));
    }

    #[test]
    fn test_missing_header_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(&dir, "nohdr.asc", "ncols 2\nnrows 2\ncellsize 1\n1 2\n3 4\n");
        let err = AsciiGridReader::new(&path).read_header().unwrap_err();
        assert!(err.to_string().contains("xllcorner"));
    }

    #[test]
    fn test_missing_file() {
        let err = AsciiGridReader::new("/nonexistent/dem.asc")
            .read_header()
            .unwrap_err();
        assert!(matches!(err, SourceReadError::Open { .. }));
    }
}
