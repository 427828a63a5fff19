//! Reader and writer for the plain-text grid-exchange format.
//!
//! A file starts with `key value` header lines (`ncols`, `nrows`, `xllcorner`,
//! `yllcorner`, `cellsize`, `nodata_value`; keys are case-insensitive and may
//! appear in any order) followed by whitespace-separated samples in row-major
//! order, top row first.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::{DEFAULT_CELL_SIZE, DEFAULT_NODATA};
use crate::error::HydrologyError;
use crate::raster::Raster;

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<f64>,
    yll: Option<f64>,
    cell_size: Option<f64>,
    nodata: Option<f64>,
}

fn parse_number<T: std::str::FromStr>(token: &str, line: usize) -> Result<T, HydrologyError> {
    token.parse().map_err(|_| HydrologyError::Parse {
        line,
        message: format!("'{token}' is not a number"),
    })
}

/// Parse grid-exchange text into a `Raster`.
pub fn parse_ascii_grid(text: &str) -> Result<Raster, HydrologyError> {
    let mut header = Header::default();
    let mut values = Vec::new();
    let mut in_data = false;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let mut tokens = line.split_whitespace().peekable();
        let Some(&first) = tokens.peek() else {
            continue;
        };

        if !in_data {
            let key = first.to_ascii_lowercase();
            let is_header = matches!(
                key.as_str(),
                "ncols" | "nrows" | "xllcorner" | "yllcorner" | "cellsize" | "nodata_value"
            );
            if is_header {
                tokens.next();
                let value = tokens.next().ok_or_else(|| HydrologyError::Parse {
                    line: line_no,
                    message: format!("header '{first}' has no value"),
                })?;
                match key.as_str() {
                    "ncols" => header.ncols = Some(parse_number(value, line_no)?),
                    "nrows" => header.nrows = Some(parse_number(value, line_no)?),
                    "xllcorner" => header.xll = Some(parse_number(value, line_no)?),
                    "yllcorner" => header.yll = Some(parse_number(value, line_no)?),
                    "cellsize" => header.cell_size = Some(parse_number(value, line_no)?),
                    _ => header.nodata = Some(parse_number(value, line_no)?),
                }
                continue;
            }
            in_data = true;
        }

        for token in tokens {
            values.push(parse_number::<f64>(token, line_no)?);
        }
    }

    let ncols = header.ncols.ok_or(HydrologyError::MissingHeader("ncols"))?;
    let nrows = header.nrows.ok_or(HydrologyError::MissingHeader("nrows"))?;
    let origin = (header.xll.unwrap_or(0.0), header.yll.unwrap_or(0.0));
    let cell_size = header.cell_size.unwrap_or(DEFAULT_CELL_SIZE);

    Ok(Raster::new(nrows, ncols, values, origin, cell_size)?
        .with_nodata(header.nodata.unwrap_or(DEFAULT_NODATA)))
}

/// Read a grid-exchange file from disk.
pub fn read_ascii_grid(path: impl AsRef<Path>) -> Result<Raster, HydrologyError> {
    let text = std::fs::read_to_string(path)?;
    parse_ascii_grid(&text)
}

/// Render a raster in grid-exchange format.
pub fn write_ascii_grid(raster: &Raster) -> String {
    let (x, y) = raster.origin();
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "ncols {}", raster.cols());
    let _ = writeln!(out, "nrows {}", raster.rows());
    let _ = writeln!(out, "xllcorner {x}");
    let _ = writeln!(out, "yllcorner {y}");
    let _ = writeln!(out, "cellsize {}", raster.cell_size());
    let _ = writeln!(out, "nodata_value {}", raster.nodata());
    for r in 0..raster.rows() {
        let row: Vec<String> = raster.row(r).iter().map(|v| v.to_string()).collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "NCOLS 3\nnrows 2\nxllcorner 10.5\nYLLCORNER -4\ncellsize 25\nNODATA_value -9999\n1 2 3\n4 5.5 6\n";

    #[test]
    fn test_parse_header_and_data() {
        let r = parse_ascii_grid(SMALL).unwrap();
        assert_eq!(r.shape(), (2, 3));
        assert_eq!(r.origin(), (10.5, -4.0));
        assert_eq!(r.cell_size(), 25.0);
        assert_eq!(r.nodata(), -9999.0);
        assert_eq!(r.get(1, 1), 5.5);
    }

    #[test]
    fn test_defaults_when_optional_keys_absent() {
        let r = parse_ascii_grid("ncols 2\nnrows 1\n7 8\n").unwrap();
        assert_eq!(r.origin(), (0.0, 0.0));
        assert_eq!(r.cell_size(), DEFAULT_CELL_SIZE);
        assert_eq!(r.nodata(), DEFAULT_NODATA);
    }

    #[test]
    fn test_wrapped_data_lines() {
        let r = parse_ascii_grid("ncols 2\nnrows 2\n1 2 3\n4\n").unwrap();
        assert_eq!(r.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_missing_nrows() {
        let err = parse_ascii_grid("ncols 2\n1 2\n").unwrap_err();
        assert!(matches!(err, HydrologyError::MissingHeader("nrows")));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_ascii_grid("ncols 2\nnrows 1\n1 x\n").unwrap_err();
        match err {
            HydrologyError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_value_count_mismatch() {
        let err = parse_ascii_grid("ncols 2\nnrows 2\n1 2 3\n").unwrap_err();
        assert!(matches!(err, HydrologyError::InvalidRaster(_)));
    }

    #[test]
    fn test_written_grid_parses_back() {
        let r = parse_ascii_grid(SMALL).unwrap();
        let again = parse_ascii_grid(&write_ascii_grid(&r)).unwrap();
        assert_eq!(again, r);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_ascii_grid("/nonexistent/lakeflow/grid.asc").unwrap_err();
        assert!(matches!(err, HydrologyError::Io(_)));
    }
}
