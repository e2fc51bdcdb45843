//! Row/column layout shared by the csv and spreadsheet engines
//!
//! An array of N dimensions becomes a grid whose first row names the axes.
//! The last leading header cell joins the last two axis names with a
//! backslash and is followed by the labels of the last axis:
//!
//! ```text
//! a,b\c,c0,c1
//! a0,b0,0,1
//! a0,b1,2,3
//! ```
//!
//! A one-dimensional array has a single data row with an empty leading cell:
//!
//! ```text
//! \a,a0,a1
//! ,0.5,NaN
//! ```
//!
//! Decoding infers the element type: all integers gives an integer array,
//! all `true`/`false` a boolean array, anything else floats (empty cells
//! are NaN).

use crate::error::{EngineError, EngineResult};
use quiver_core::{Axis, Dtype, LabeledArray};

pub(crate) const AXIS_SEPARATOR: char = '\\';

/// One data row: the leading labels and the values along the last axis
pub(crate) struct TableRow<'a> {
    pub labels: Vec<String>,
    pub values: &'a [f64],
}

/// Reject arrays without axes; they have no grid representation
pub(crate) fn check_encodable(array: &LabeledArray, target: &str) -> EngineResult<()> {
    if array.ndim() == 0 {
        return Err(EngineError::encode(format!(
            "{}: zero-dimensional arrays cannot be stored as a table",
            target
        )));
    }
    Ok(())
}

/// Header row of `array`
///
/// `array` must have at least one axis.
pub(crate) fn header_row(array: &LabeledArray) -> Vec<String> {
    let axes = array.axes();
    let Some((last, leading)) = axes.split_last() else {
        return Vec::new();
    };
    let mut header: Vec<String> = Vec::with_capacity(axes.len() + last.len());
    match leading.split_last() {
        Some((prev, rest)) => {
            header.extend(rest.iter().map(|a| a.name().to_string()));
            header.push(format!("{}{}{}", prev.name(), AXIS_SEPARATOR, last.name()));
        }
        None => header.push(format!("{}{}", AXIS_SEPARATOR, last.name())),
    }
    header.extend(last.labels().iter().cloned());
    header
}

/// Data rows of `array` in row-major order
pub(crate) fn data_rows(array: &LabeledArray) -> Vec<TableRow<'_>> {
    let axes = array.axes();
    let Some((last, leading)) = axes.split_last() else {
        return Vec::new();
    };
    let row_len = last.len();
    let n_rows = if leading.is_empty() {
        1
    } else {
        leading.iter().map(Axis::len).product()
    };
    let values = array.values();
    (0..n_rows)
        .map(|row| {
            let labels = if leading.is_empty() {
                vec![String::new()]
            } else {
                row_labels(leading, row)
            };
            let start = row * row_len;
            TableRow {
                labels,
                values: &values[start..start + row_len],
            }
        })
        .collect()
}

/// Labels of the leading axes for row number `row` (row-major)
fn row_labels(leading: &[Axis], mut row: usize) -> Vec<String> {
    let mut labels = vec![String::new(); leading.len()];
    for (i, axis) in leading.iter().enumerate().rev() {
        labels[i] = axis.labels()[row % axis.len()].clone();
        row /= axis.len();
    }
    labels
}

/// Text form of one value
pub(crate) fn format_cell(value: f64, dtype: Dtype) -> String {
    match dtype {
        Dtype::Bool => (value != 0.0).to_string(),
        Dtype::Int => (value as i64).to_string(),
        Dtype::Float => format!("{:?}", value),
    }
}

/// Rebuild an array from a grid of text cells, header row first
///
/// `file` names the source in errors.
pub(crate) fn decode_rows<I>(file: &str, rows: I) -> EngineResult<LabeledArray>
where
    I: IntoIterator<Item = EngineResult<Vec<String>>>,
{
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(row) => row?,
        None => return Err(EngineError::decode(file, "empty table")),
    };

    let split = header
        .iter()
        .position(|cell| cell.contains(AXIS_SEPARATOR))
        .ok_or_else(|| EngineError::decode(file, "no axis header cell"))?;
    let (prev, last_name) = header[split]
        .split_once(AXIS_SEPARATOR)
        .ok_or_else(|| EngineError::decode(file, "no axis header cell"))?;

    let mut leading_names: Vec<String> = header[..split].to_vec();
    if !prev.is_empty() {
        leading_names.push(prev.to_string());
    } else if split > 0 {
        return Err(EngineError::decode(file, "empty axis name in header"));
    }
    let n_lead_cells = split + 1;
    let last_labels: Vec<String> = header[n_lead_cells..].to_vec();
    let width = n_lead_cells + last_labels.len();

    let mut leading_labels: Vec<Vec<String>> = vec![Vec::new(); leading_names.len()];
    let mut body: Vec<(Vec<usize>, Vec<String>)> = Vec::new();
    for (line, row) in rows.enumerate() {
        let row = row?;
        if row.len() != width {
            return Err(EngineError::decode(
                file,
                format!("row {} has {} cells, expected {}", line + 2, row.len(), width),
            ));
        }
        let mut position = Vec::with_capacity(leading_names.len());
        for (i, labels) in leading_labels.iter_mut().enumerate() {
            let label = &row[i];
            let index = match labels.iter().position(|l| l == label) {
                Some(index) => index,
                None => {
                    labels.push(label.clone());
                    labels.len() - 1
                }
            };
            position.push(index);
        }
        let cells = row[n_lead_cells..].iter().map(|s| s.trim().to_string()).collect();
        body.push((position, cells));
    }

    if leading_names.is_empty() && body.len() != 1 {
        return Err(EngineError::decode(
            file,
            format!("one-dimensional array needs exactly one data row, got {}", body.len()),
        ));
    }

    let cells: Vec<&str> = body
        .iter()
        .flat_map(|(_, cells)| cells.iter().map(String::as_str))
        .collect();
    let dtype = infer_dtype(&cells);

    let mut axes = Vec::with_capacity(leading_names.len() + 1);
    for (name, labels) in leading_names.into_iter().zip(leading_labels) {
        axes.push(Axis::new(name, labels).map_err(|e| EngineError::decode(file, e.to_string()))?);
    }
    let last_axis =
        Axis::new(last_name, last_labels).map_err(|e| EngineError::decode(file, e.to_string()))?;
    let row_len = last_axis.len();
    axes.push(last_axis);

    let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
    let size: usize = shape.iter().product();
    let mut data = vec![f64::NAN; size];
    for (position, cells) in &body {
        let mut offset = 0;
        for (axis, index) in position.iter().enumerate() {
            offset = offset * shape[axis] + index;
        }
        offset *= row_len;
        for (j, cell) in cells.iter().enumerate() {
            data[offset + j] = parse_cell(cell, dtype)
                .ok_or_else(|| EngineError::decode(file, format!("invalid cell '{}'", cell)))?;
        }
    }

    LabeledArray::new(axes, dtype, data).map_err(|e| EngineError::decode(file, e.to_string()))
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_dtype(cells: &[&str]) -> Dtype {
    if cells.is_empty() {
        return Dtype::Float;
    }
    if cells.iter().all(|c| c.parse::<i64>().is_ok()) {
        Dtype::Int
    } else if cells.iter().all(|c| parse_bool(c).is_some()) {
        Dtype::Bool
    } else {
        Dtype::Float
    }
}

fn parse_cell(cell: &str, dtype: Dtype) -> Option<f64> {
    match dtype {
        Dtype::Int => cell.parse::<i64>().ok().map(|v| v as f64),
        Dtype::Bool => parse_bool(cell).map(|b| if b { 1.0 } else { 0.0 }),
        Dtype::Float if cell.is_empty() => Some(f64::NAN),
        Dtype::Float => cell.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<EngineResult<Vec<String>>> {
        rows.iter()
            .map(|row| Ok(row.iter().map(|c| c.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_header_and_rows() {
        let array = LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 2), Axis::range("c", 2)]);
        assert_eq!(header_row(&array), vec!["a", "b\\c", "c0", "c1"]);

        let rows = data_rows(&array);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].labels, vec!["a1", "b0"]);
        assert_eq!(rows[2].values, &[4.0, 5.0]);

        let one_d = LabeledArray::sequence(vec![Axis::range("x", 3)]);
        assert_eq!(header_row(&one_d), vec!["\\x", "x0", "x1", "x2"]);
        assert_eq!(data_rows(&one_d)[0].labels, vec![String::new()]);
    }

    #[test]
    fn test_decode_infers_dtype() {
        let ints = decode_rows("t", grid(&[&["\\a", "a0", "a1"], &["", "1", "-2"]])).unwrap();
        assert_eq!(ints.dtype(), Dtype::Int);

        let bools = decode_rows("t", grid(&[&["\\a", "a0"], &["", "TRUE"]])).unwrap();
        assert_eq!(bools.dtype(), Dtype::Bool);

        let floats = decode_rows("t", grid(&[&["\\a", "a0", "a1"], &["", "inf", ""]])).unwrap();
        assert_eq!(floats.dtype(), Dtype::Float);
        assert!(floats.values()[0].is_infinite());
        assert!(floats.values()[1].is_nan());
    }

    #[test]
    fn test_decode_missing_rows_are_nan() {
        let array = decode_rows(
            "t",
            grid(&[&["a", "b\\c", "c0"], &["a0", "b0", "1.5"], &["a1", "b1", "2"]]),
        )
        .unwrap();
        assert_eq!(array.shape(), vec![2, 2, 1]);
        assert!(array.get(&["a0", "b1", "c0"]).unwrap().is_nan());
        assert_eq!(array.get(&["a1", "b1", "c0"]), Some(2.0));
    }

    #[test]
    fn test_decode_errors() {
        let cases: Vec<Vec<EngineResult<Vec<String>>>> = vec![
            Vec::new(),
            grid(&[&["a", "b"], &["x", "1"]]),
            grid(&[&["\\a", "a0"], &["", "1", "2"]]),
            grid(&[&["\\a", "a0"], &["", "1"], &["", "2"]]),
            grid(&[&["x", "\\a", "a0"], &["x", "", "1"]]),
            grid(&[&["a\\b", "b0"], &["a0", "abc"], &["a1", "true"]]),
        ];
        for rows in cases {
            assert!(matches!(decode_rows("t", rows), Err(EngineError::Decode { .. })));
        }
    }

    #[test]
    fn test_zero_dimensional_not_encodable() {
        let scalar = LabeledArray::scalar(Dtype::Int, 1.0);
        assert!(matches!(check_encodable(&scalar, "s"), Err(EngineError::Encode(_))));
        assert!(header_row(&scalar).is_empty());
    }
}
