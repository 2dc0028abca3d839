use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
    BufWriter,
    Write
};
use std::path::Path;

use crate::curve::coefficient::coefficient::Coefficient;
use crate::curve::coefficient::coefficientmanager::CoefficientManager;
use crate::curve::curve::Time;
use crate::curve::curveerror::CurveError;

// 文字表格格式：每個係數一列，依時間遞增
//
//   time, v_0, v_1, ..., v_n
//
// f64 以 `Display` 輸出（最短可還原表示法），讀回後數值完全相同。

pub fn save_curve_times_and_values<V, P>(manager: &CoefficientManager<V>, file_path: P) -> Result<(), CurveError>
    where V: Coefficient, P: AsRef<Path> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    for entry in manager.iter() {
        write!(writer, "{}", entry.time())?;
        for value in entry.coefficient().to_row() {
            write!(writer, ", {}", value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_curve_times_and_values<V, P>(file_path: P) -> Result<(Vec<Time>, Vec<V>), CurveError>
    where V: Coefficient, P: AsRef<Path> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let mut times = Vec::new();
    let mut values = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (time, value) = parse_row(&line).map_err(|reason| CurveError::ParseError {
            line: index + 1,
            reason
        })?;
        times.push(time);
        values.push(value);
    }
    Ok((times, values))
}

fn parse_row<V: Coefficient>(line: &str) -> Result<(Time, V), String> {
    let mut fields = line.split(',').map(str::trim);
    let time = fields
        .next()
        .ok_or_else(|| "missing time".to_owned())?
        .parse::<Time>()
        .map_err(|error| error.to_string())?;
    let row = fields
        .map(|field| field.parse::<f64>().map_err(|error| format!("'{}': {}", field, error)))
        .collect::<Result<Vec<f64>, String>>()?;
    if row.is_empty() {
        return Err(format!("no values after time {}", time));
    }
    let value = V::from_row(&row).map_err(|error| error.to_string())?;
    Ok((time, value))
}
