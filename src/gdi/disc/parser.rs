use crate::cd::SECTOR_SIZE;
use crate::gdi::disc::GdiDisc;
use crate::gdi::track::{TrackRecord, TrackType};
use crate::logger::SharedLogger;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MIN_TRACK_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    ExpectingTrackCount,
    ExpectingTrackLine,
}

/// Push based `.gdi` parser. Lines must be fed in file order, then [`GdiParser::finish`]
/// is called once the line source is exhausted.
pub struct GdiParser {
    source_dir: PathBuf,
    state: ParserState,
    track_count: u32,
    records: BTreeMap<u32, TrackRecord>,
    logger: SharedLogger,
}

impl GdiParser {
    pub fn new(source_dir: impl AsRef<Path>, logger: SharedLogger) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            state: ParserState::ExpectingTrackCount,
            track_count: 0,
            records: BTreeMap::new(),
            logger,
        }
    }

    pub fn track_count(&self) -> u32 {
        self.track_count
    }

    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> {
        self.records.values()
    }

    /// Decodes one raw line (without its terminator) and feeds it to [`GdiParser::handle_line`].
    ///
    /// A line that is not valid UTF-8 is reported and dropped.
    pub fn handle_raw_line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => self.handle_line(line),
            Err(e) => self.logger.error(&format!(
                "Skipping undecodable gdi line ({e}): {}",
                String::from_utf8_lossy(raw)
            )),
        }
    }

    pub fn handle_line(&mut self, line: &str) {
        match self.state {
            ParserState::ExpectingTrackCount => {
                self.logger.log(&format!("IndexLine: {line}"));
                if let Some(count) = parse_track_count(line) {
                    self.track_count = count;
                    self.state = ParserState::ExpectingTrackLine;
                }
            }
            ParserState::ExpectingTrackLine => {
                self.logger.log(&format!("TrackLine: {line}"));
                let Some(record) = parse_track_line(line) else {
                    if !line.trim().is_empty() {
                        self.logger.log(&format!("Skipping malformed track line: {line}"));
                    }
                    return;
                };

                if self.records.contains_key(&record.number) {
                    self.logger.error(&format!(
                        "Duplicated track index {} in gdi file, line ignored",
                        record.number
                    ));
                } else {
                    self.records.insert(record.number, record);
                }
            }
        }
    }

    /// End of stream: opens every track, loads IP.BIN from track 3 and freezes the disc.
    pub async fn finish(self) -> GdiDisc {
        GdiDisc::build(self.source_dir, self.track_count, self.records, self.logger).await
    }
}

/// Leading decimal integer of the line, ignoring a byte order mark and whatever follows the digits.
fn parse_track_count(line: &str) -> Option<u32> {
    let line = line.trim_start_matches('\u{feff}').trim_start();
    let end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    line[..end].parse().ok()
}

/// Splits on whitespace, keeping a double quoted segment as one field without its quotes.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_field = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if c == '"' {
            let mut quoted = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(q) => quoted.push(q),
                    // unterminated quote
                    None => return None,
                }
            }
            current.push_str(&quoted);
            in_field = true;
        } else if c.is_whitespace() {
            if in_field {
                fields.push(std::mem::take(&mut current));
                in_field = false;
            }
        } else {
            current.push(c);
            in_field = true;
        }
    }
    if in_field {
        fields.push(current);
    }

    Some(fields)
}

/// Parses `<idx> <lba> <type> <sector size> <filename> <reserved>`.
pub fn parse_track_line(line: &str) -> Option<TrackRecord> {
    let fields = split_fields(line)?;
    if fields.len() < MIN_TRACK_FIELDS {
        return None;
    }

    let number: u32 = fields[0].parse().ok().filter(|&n| n > 0)?;
    let lba: u32 = fields[1].parse().ok()?;
    let track_type = TrackType::from_type_id(fields[2].parse().ok()?)?;
    let sector_size: u32 = fields[3].parse().ok().filter(|&s| s == SECTOR_SIZE as u32)?;
    let filename = fields[4].clone();
    let reserved: i64 = fields[5]
        .parse()
        .ok()
        .or_else(|| fields.last()?.parse().ok())?;

    Some(TrackRecord {
        number,
        lba,
        track_type,
        sector_size,
        filename,
        reserved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::tests::{Level, MemoryLogger};
    use std::sync::Arc;

    #[test]
    fn parses_plain_track_line() {
        let record = parse_track_line("3 45000 4 2352 track03.bin 0").unwrap();
        assert_eq!(
            record,
            TrackRecord {
                number: 3,
                lba: 45000,
                track_type: TrackType::Data,
                sector_size: 2352,
                filename: "track03.bin".to_string(),
                reserved: 0,
            }
        );
    }

    #[test]
    fn parses_quoted_filename_verbatim() {
        let record = parse_track_line("3 45000 4 2352 \"My Game (Disc 1).bin\" 0").unwrap();
        assert_eq!(record.filename, "My Game (Disc 1).bin");

        let spaced = parse_track_line("3   45000  4 2352    \"My Game (Disc 1).bin\"   0").unwrap();
        assert_eq!(spaced, record);

        let inner = parse_track_line("3 45000 4 2352 \"a  b\" 0").unwrap();
        assert_eq!(inner.filename, "a  b");
    }

    #[test]
    fn indented_two_digit_line_parses_like_unindented() {
        let indented = parse_track_line(" 10 549696 0 2352 track10.raw 0").unwrap();
        let plain = parse_track_line("10 549696 0 2352 track10.raw 0").unwrap();
        assert_eq!(indented, plain);
        assert_eq!(indented.number, 10);
        assert_eq!(indented.track_type, TrackType::Audio);
    }

    #[test]
    fn reserved_falls_back_to_last_field() {
        let record = parse_track_line("4 600 0 2352 track04.raw x 7").unwrap();
        assert_eq!(record.reserved, 7);
        assert_eq!(record.filename, "track04.raw");
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_track_line("").is_none());
        assert!(parse_track_line("3 45000 4 2352 track03.bin").is_none());
        assert!(parse_track_line("3 45000 4 2048 track03.bin 0").is_none());
        assert!(parse_track_line("3 45000 1 2352 track03.bin 0").is_none());
        assert!(parse_track_line("0 45000 4 2352 track03.bin 0").is_none());
        assert!(parse_track_line("-1 45000 4 2352 track03.bin 0").is_none());
        assert!(parse_track_line("3 -5 4 2352 track03.bin 0").is_none());
        assert!(parse_track_line("x 45000 4 2352 track03.bin 0").is_none());
        assert!(parse_track_line("3 45000 4 2352 track03.bin y").is_none());
        assert!(parse_track_line("3 45000 4 2352 \"unterminated.bin 0").is_none());
    }

    #[test]
    fn state_machine_reads_count_then_tracks() {
        let logger = Arc::new(MemoryLogger::default());
        let mut parser = GdiParser::new(".", logger.clone());

        parser.handle_line("not a number");
        parser.handle_line("3");
        parser.handle_line("1 0 4 2352 track01.bin 0");
        parser.handle_line("garbage");
        parser.handle_line("2 450 0 2352 track02.raw 0");
        parser.handle_line("2 999 0 2352 other.raw 0");
        parser.handle_line("3 45000 4 2352 track03.bin 0");

        assert_eq!(parser.track_count(), 3);
        let numbers: Vec<u32> = parser.records().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        let track2 = parser.records().find(|r| r.number == 2).unwrap();
        assert_eq!(track2.lba, 450);
        assert_eq!(logger.count(Level::Error), 1);
        assert!(logger.contains(Level::Error, "Duplicated track index 2"));
    }

    #[test]
    fn records_are_ordered_by_index_not_insertion() {
        let mut parser = GdiParser::new(".", crate::logger::default_logger());
        parser.handle_line("3");
        parser.handle_line("3 45000 4 2352 track03.bin 0");
        parser.handle_line("1 0 4 2352 track01.bin 0");
        parser.handle_line("2 450 0 2352 track02.raw 0");

        let numbers: Vec<u32> = parser.records().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn track_count_takes_leading_integer() {
        assert_eq!(parse_track_count("3"), Some(3));
        assert_eq!(parse_track_count("\u{feff}3"), Some(3));
        assert_eq!(parse_track_count("  12\t"), Some(12));
        assert_eq!(parse_track_count("3abc"), Some(3));
        assert_eq!(parse_track_count("3.0"), Some(3));
        assert_eq!(parse_track_count("abc"), None);
        assert_eq!(parse_track_count(""), None);
    }

    #[test]
    fn bom_prefixed_count_line_still_reads_tracks() {
        let mut parser = GdiParser::new(".", crate::logger::default_logger());
        parser.handle_raw_line("\u{feff}2\r\n".as_bytes());
        parser.handle_raw_line(b"1 0 4 2352 track01.bin 0\r\n");
        parser.handle_raw_line(b"2 450 0 2352 track02.raw 0");

        assert_eq!(parser.track_count(), 2);
        let names: Vec<&str> = parser.records().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["track01.bin", "track02.raw"]);
    }

    #[test]
    fn undecodable_line_is_dropped_and_reported() {
        let logger = Arc::new(MemoryLogger::default());
        let mut parser = GdiParser::new(".", logger.clone());
        parser.handle_raw_line(b"2\n");
        parser.handle_raw_line(b"1 0 4 2352 track01.bin 0\n");
        parser.handle_raw_line(b"2 50000 0 2352 \"\x83Q\x81[\x83\x80.raw\" 0\n");

        assert_eq!(parser.records().count(), 1);
        assert!(logger.contains(Level::Error, "Skipping undecodable gdi line"));
    }
}
