// Writes the timeline as CSV, one line per record.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::SecondsFormat;
use log::debug;
use snafu::prelude::*;
use vote_timeline::{Record, Timeline};

use crate::tracker::*;

const HEADER: [&str; 10] = [
    "state",
    "timestamp",
    "unit_abbrev",
    "electoral_votes",
    "candidates",
    "total_votes",
    "expected_total_votes",
    "precincts_total",
    "precincts_reporting",
    "hurdle_moving_average",
];

fn candidates_cell(r: &Record) -> String {
    r.candidates()
        .iter()
        .map(|c| format!("{}:{}", c.id, c.votes))
        .collect::<Vec<String>>()
        .join(";")
}

fn record_row(state: &str, r: &Record) -> Vec<String> {
    vec![
        state.to_string(),
        r.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
        r.unit_abbrev().to_string(),
        r.electoral_votes().to_string(),
        candidates_cell(r),
        r.total_votes().to_string(),
        r.expected_total_votes().to_string(),
        r.precincts_total().to_string(),
        r.precincts_reporting().to_string(),
        r.hurdle_moving_average()
            .map(|h| h.to_string())
            .unwrap_or_default(),
    ]
}

pub fn write_timeline_csv<W: Write>(writer: W, timeline: &Timeline) -> TrackerResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).context(CsvWriteSnafu {})?;
    for (state, records) in timeline.iter() {
        debug!("write_timeline_csv: {} records for {}", records.len(), state);
        for r in records.iter() {
            wtr.write_record(record_row(state, r))
                .context(CsvWriteSnafu {})?;
        }
    }
    wtr.flush()
        .map_err(csv::Error::from)
        .context(CsvWriteSnafu {})?;
    Ok(())
}

pub fn write_timeline_csv_file(path: &Path, timeline: &Timeline) -> TrackerResult<()> {
    let file = File::create(path).context(WritingOutputSnafu { path })?;
    write_timeline_csv(file, timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vote_timeline::builder::RecordBuilder;

    #[test]
    fn writes_header_and_rows() {
        let t = Utc.with_ymd_and_hms(2020, 11, 5, 14, 30, 0).unwrap();
        let nevada = RecordBuilder::new("Nevada", t)
            .abbrev("NV")
            .electoral_votes(6)
            .candidate("bidenj", 900)
            .candidate("trumpd", 600)
            .total_votes(1500)
            .expected_total_votes(3000)
            .precincts(50, 100)
            .build()
            .with_hurdle(Some(0.4));
        let mut timeline = Timeline::new();
        timeline.insert("Nevada".to_string(), vec![nevada.clone(), nevada.with_hurdle(None)]);

        let mut out: Vec<u8> = Vec::new();
        write_timeline_csv(&mut out, &timeline).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(
            lines[1],
            "Nevada,2020-11-05T14:30:00Z,NV,6,bidenj:900;trumpd:600,1500,3000,100,50,0.4"
        );
        assert!(lines[2].ends_with(",100,50,"));
    }

    #[test]
    fn empty_timeline_has_only_header() {
        let mut out: Vec<u8> = Vec::new();
        write_timeline_csv(&mut out, &Timeline::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", HEADER.join(",")));
    }
}
