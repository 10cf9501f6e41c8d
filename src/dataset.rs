use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Lines preceding the CSV header in an instrument file.
pub const PREAMBLE_LINES: usize = 3;

const COMMENTS_PREFIX: &str = "Comments: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Voltage,
    Current,
    Thermistor(usize),
}

/// One recording from the thermal-wave rig.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub timestamp: Vec<f64>,
    pub output_voltage: Vec<f64>,
    pub output_current: Vec<f64>,
    /// One series per thermistor column, in file order.
    pub thermistors: Vec<Vec<f64>>,
    pub comments: String,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    pub fn channel(&self, channel: Channel) -> Result<&[f64]> {
        match channel {
            Channel::Voltage => Ok(&self.output_voltage),
            Channel::Current => Ok(&self.output_current),
            Channel::Thermistor(i) => self
                .thermistors
                .get(i)
                .map(|c| c.as_slice())
                .ok_or_else(|| anyhow!("Thermistor {} out of range ({} columns)", i, self.thermistors.len())),
        }
    }
}

pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    info!("Loading dataset from {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let dataset = parse_dataset(&content)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

    info!(
        "Loaded {} samples, {} thermistor columns",
        dataset.len(),
        dataset.thermistors.len()
    );
    Ok(dataset)
}

pub fn parse_dataset(content: &str) -> Result<Dataset> {
    let comments = content
        .lines()
        .find_map(|line| line.find(COMMENTS_PREFIX).map(|pos| &line[pos + COMMENTS_PREFIX.len()..]))
        .map(|c| c.trim_end().to_string())
        .ok_or_else(|| anyhow!("No \"{}\" line found", COMMENTS_PREFIX.trim_end()))?;

    let mut lines = content
        .lines()
        .enumerate()
        .skip(PREAMBLE_LINES)
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| anyhow!("Missing column header"))?;
    let n_columns = header.split(',').count();
    if n_columns < 3 {
        bail!("Expected at least 3 columns, header has {}", n_columns);
    }
    debug!("Header: {}", header.trim());

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); n_columns];
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != n_columns {
            bail!(
                "Line {}: expected {} fields, found {}",
                line_no + 1,
                n_columns,
                fields.len()
            );
        }
        for (column, field) in columns.iter_mut().zip(fields) {
            let value = field
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Line {}: invalid number '{}'", line_no + 1, field.trim()))?;
            column.push(value);
        }
    }

    let thermistors = columns.split_off(3);
    let mut columns = columns.into_iter();
    Ok(Dataset {
        timestamp: columns.next().unwrap_or_default(),
        output_voltage: columns.next().unwrap_or_default(),
        output_current: columns.next().unwrap_or_default(),
        thermistors,
        comments,
    })
}

pub fn save_dataset<P: AsRef<Path>>(path: P, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    info!("Saving dataset to {}", path.display());

    let n = dataset.len();
    if dataset.output_voltage.len() != n
        || dataset.output_current.len() != n
        || dataset.thermistors.iter().any(|c| c.len() != n)
    {
        bail!("All dataset columns must have {} samples", n);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create dataset: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "Dummy line 1")?;
    writeln!(out, "Dummy line 2")?;
    writeln!(out, "{}{}", COMMENTS_PREFIX, dataset.comments)?;

    let mut header = vec!["timestamp".to_string(), "output_voltage".to_string(), "output_current".to_string()];
    header.extend((0..dataset.thermistors.len()).map(|i| format!("therm_{}", i)));
    writeln!(out, "{}", header.join(","))?;

    for i in 0..n {
        let mut row = vec![
            dataset.timestamp[i].to_string(),
            dataset.output_voltage[i].to_string(),
            dataset.output_current[i].to_string(),
        ];
        row.extend(dataset.thermistors.iter().map(|c| c[i].to_string()));
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;

    debug!("Wrote {} rows", n);
    Ok(())
}

/// Two-column `t,y` CSV of a (truncated) series.
pub fn save_series<P: AsRef<Path>>(path: P, t: &[f64], y: &[f64]) -> Result<()> {
    let path = path.as_ref();
    info!("Saving {} samples to {}", t.len(), path.display());

    let file = File::create(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "t,y")?;
    for (ti, yi) in t.iter().zip(y) {
        writeln!(out, "{},{}", ti, yi)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "Lab rig 2\nOperator: AB\nComments: Period = 15.0\n\
timestamp,output_voltage,output_current,therm_0,therm_1\n\
0.0,1.5,0.2,20.1,20.0\n\
0.1,1.5,0.2,20.3,20.1\n\
\n\
0.2,1.4,0.2,20.2,20.2\n";

    #[test]
    fn test_parse_dataset() {
        let dataset = parse_dataset(SAMPLE).unwrap();
        assert_eq!(dataset.comments, "Period = 15.0");
        assert_eq!(dataset.timestamp, vec![0.0, 0.1, 0.2]);
        assert_eq!(dataset.output_voltage, vec![1.5, 1.5, 1.4]);
        assert_eq!(dataset.thermistors.len(), 2);
        assert_eq!(dataset.thermistors[1], vec![20.0, 20.1, 20.2]);
        assert_eq!(dataset.channel(Channel::Thermistor(0)).unwrap(), &[20.1, 20.3, 20.2]);
        assert!(dataset.channel(Channel::Thermistor(2)).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_dataset("a\nb\nc\nt,v,i\n0,0,0\n").is_err());
        let ragged = SAMPLE.replace("0.1,1.5,0.2,20.3,20.1", "0.1,1.5,0.2");
        assert!(parse_dataset(&ragged).is_err());
        let garbage = SAMPLE.replace("20.3", "hot");
        assert!(parse_dataset(&garbage).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dataset = Dataset {
            timestamp: vec![0.0, 0.1, 0.2],
            output_voltage: vec![0.0; 3],
            output_current: vec![0.0; 3],
            thermistors: vec![vec![20.0, 21.5, 19.25], vec![20.0, 20.5, 20.0]],
            comments: "Period = 30".to_string(),
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roundtrip.csv");
        save_dataset(&path, &dataset).unwrap();
        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_dataset(dir.path().join("missing.csv")).is_err());
    }
}
