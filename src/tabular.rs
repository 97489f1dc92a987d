//! Delimited-table collaborators around the conversion core: a reader for
//! raw recordings (plain or gzip-compressed), timestamp alignment onto epoch
//! boundaries and a writer for the count table.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{Duration, DurationRound, NaiveDateTime};
use flate2::read::GzDecoder;

use crate::error::{CountsError, CountsResult};
use crate::types::{EpochCounts, RawSeries};

/// Raw samples read from a delimited table, plus the unparsed values of the
/// requested timestamp column
pub struct RawTable {
    pub series: RawSeries,
    pub timestamps: Vec<String>,
}

/// Read a raw recording with a header row and numeric columns named
/// "X", "Y" and "Z". Files ending in .gz are decompressed transparently.
pub fn read_raw_table(path: &Path, time_column: Option<&str>) -> CountsResult<RawTable> {
    let file = File::open(path)?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        parse_raw_table(BufReader::new(GzDecoder::new(file)), time_column)
    } else {
        parse_raw_table(BufReader::new(file), time_column)
    }
}

fn parse_raw_table<R: BufRead>(reader: R, time_column: Option<&str>) -> CountsResult<RawTable> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(CountsError::Table {
                line: 1,
                message: "missing header row".into(),
            })
        }
    };
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect();

    let ix = column_index(&columns, "X")?;
    let iy = column_index(&columns, "Y")?;
    let iz = column_index(&columns, "Z")?;
    let it = match time_column {
        Some(name) => Some(column_index(&columns, name)?),
        None => None,
    };

    let mut series = RawSeries::new();
    let mut timestamps = Vec::new();
    for (offset, line) in lines.enumerate() {
        let line = line?;
        let line_no = offset + 2;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();

        let x = number_field(&fields, ix, line_no)?;
        let y = number_field(&fields, iy, line_no)?;
        let z = number_field(&fields, iz, line_no)?;
        series.push(x, y, z);

        if let Some(index) = it {
            timestamps.push(text_field(&fields, index, line_no)?.to_string());
        }
    }

    Ok(RawTable { series, timestamps })
}

fn column_index(columns: &[String], name: &str) -> CountsResult<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| CountsError::Table {
            line: 1,
            message: format!("column {:?} not found in header", name),
        })
}

fn text_field<'a>(fields: &[&'a str], index: usize, line: usize) -> CountsResult<&'a str> {
    fields
        .get(index)
        .map(|f| f.trim().trim_matches('"'))
        .ok_or_else(|| CountsError::Table {
            line,
            message: format!("expected at least {} fields, got {}", index + 1, fields.len()),
        })
}

fn number_field(fields: &[&str], index: usize, line: usize) -> CountsResult<f64> {
    let text = text_field(fields, index, line)?;
    text.parse::<f64>().map_err(|_| CountsError::Table {
        line,
        message: format!("invalid number {:?}", text),
    })
}

fn parse_timestamp(text: &str) -> CountsResult<NaiveDateTime> {
    const FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S%.f",
    ];
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    Err(CountsError::Timestamp(format!(
        "unrecognized timestamp {:?}",
        text
    )))
}

/// Turn per-sample timestamps into per-epoch stamps: parse, round each one
/// to the epoch boundary, keep the first occurrence of every distinct value
/// and truncate to the number of epochs.
pub fn align_timestamps(
    stamps: &[String],
    epoch_seconds: u32,
    n_epochs: usize,
) -> CountsResult<Vec<NaiveDateTime>> {
    let span = Duration::seconds(epoch_seconds as i64);
    let mut seen = HashSet::new();
    let mut aligned = Vec::new();
    for text in stamps {
        let rounded = parse_timestamp(text)?
            .duration_round(span)
            .map_err(|e| CountsError::Timestamp(e.to_string()))?;
        if seen.insert(rounded) {
            aligned.push(rounded);
            if aligned.len() == n_epochs {
                break;
            }
        }
    }
    Ok(aligned)
}

/// Write the count table: optional leading time column, integer X, Y, Z and
/// the vector magnitude AC. Epochs beyond the last timestamp get an empty
/// time cell.
pub fn write_counts_table(
    path: &Path,
    counts: &EpochCounts,
    timestamps: &[NaiveDateTime],
    time_column: Option<&str>,
) -> CountsResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match time_column {
        Some(name) => writeln!(writer, "{},X,Y,Z,AC", name)?,
        None => writeln!(writer, "X,Y,Z,AC")?,
    }

    for epoch in 0..counts.num_epochs() {
        let [x, y, z] = counts.row(epoch);
        let ac = counts.vector_magnitude(epoch);
        if time_column.is_some() {
            let stamp = timestamps
                .get(epoch)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            writeln!(writer, "{},{},{},{},{}", stamp, x, y, z, ac)?;
        } else {
            writeln!(writer, "{},{},{},{}", x, y, z, ac)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write as _;

    const SMALL_TABLE: &str = "\
Timestamp,X,Y,Z
2017-01-01 12:00:00.000,0.1,0.2,0.3
2017-01-01 12:00:00.033,-0.4,0.5,1.0
2017-01-01 12:00:00.066,0.0,0.0,0.9
";

    #[test]
    fn test_read_plain_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(&path, SMALL_TABLE).unwrap();

        let table = read_raw_table(&path, Some("Timestamp")).unwrap();
        assert_eq!(table.series.len(), 3);
        assert_eq!(table.series.x, vec![0.1, -0.4, 0.0]);
        assert_eq!(table.series.z, vec![0.3, 1.0, 0.9]);
        assert_eq!(table.timestamps.len(), 3);
        assert_eq!(table.timestamps[1], "2017-01-01 12:00:00.033");

        // same file without the time column requested
        let table = read_raw_table(&path, None).unwrap();
        assert!(table.timestamps.is_empty());
    }

    #[test]
    fn test_read_gz_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(SMALL_TABLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let table = read_raw_table(&path, None).unwrap();
        assert_eq!(table.series.len(), 3);
        assert_eq!(table.series.y, vec![0.2, 0.5, 0.0]);
    }

    #[test]
    fn test_read_errors_carry_line_numbers() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("missing.csv");
        fs::write(&path, "Timestamp,X,Y\n2017-01-01 12:00:00,0.1,0.2\n").unwrap();
        match read_raw_table(&path, None) {
            Err(CountsError::Table { line: 1, message }) => {
                assert!(message.contains("\"Z\""), "{}", message)
            }
            other => panic!("expected header error, got {:?}", other.map(|_| ())),
        }

        let path = dir.path().join("badnum.csv");
        fs::write(&path, "X,Y,Z\n0.1,0.2,0.3\n0.4,oops,0.6\n").unwrap();
        match read_raw_table(&path, None) {
            Err(CountsError::Table { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("oops"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_align_timestamps() {
        let stamps: Vec<String> = (0..180)
            .map(|i| format!("2017-01-01 12:00:{:02}.{:03}", i / 3, (i % 3) * 333))
            .collect();
        // 60 s worth of stamps rounding onto 10 s boundaries
        let aligned = align_timestamps(&stamps, 10, 100).unwrap();
        let want: Vec<NaiveDateTime> = [
            "2017-01-01 12:00:00",
            "2017-01-01 12:00:10",
            "2017-01-01 12:00:20",
            "2017-01-01 12:00:30",
            "2017-01-01 12:00:40",
            "2017-01-01 12:00:50",
            "2017-01-01 12:01:00",
        ]
        .iter()
        .map(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
        .collect();
        assert_eq!(aligned, want);

        // truncation to the epoch count
        let aligned = align_timestamps(&stamps, 10, 3).unwrap();
        assert_eq!(aligned.len(), 3);

        assert!(matches!(
            align_timestamps(&["yesterday".to_string()], 10, 1),
            Err(CountsError::Timestamp(_))
        ));
    }

    #[test]
    fn test_write_counts_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");

        let counts = EpochCounts::from_axes(vec![3, 10], vec![4, 0], vec![0, 2]);
        let stamps =
            vec![NaiveDateTime::parse_from_str("2017-01-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()];
        write_counts_table(&path, &counts, &stamps, Some("Timestamp")).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "Timestamp,X,Y,Z,AC");
        assert_eq!(lines[1], "2017-01-01 12:00:00,3,4,0,5");
        // second epoch has no timestamp left
        assert!(lines[2].starts_with(",10,0,2,"));
        assert_eq!(lines.len(), 3);

        let path = dir.path().join("counts_no_time.csv");
        write_counts_table(&path, &counts, &[], None).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("X,Y,Z,AC\n3,4,0,5\n"));
    }
}
