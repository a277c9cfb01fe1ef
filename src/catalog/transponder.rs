use serde::Serialize;

pub const MAX_TRANSPONDERS: usize = 10;

/// One transponder mode of a satellite. Frequencies in MHz.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transponder {
    pub name: Option<String>,
    pub uplink_start: f64,
    pub uplink_end: f64,
    pub downlink_start: f64,
    pub downlink_end: f64,
    /// Bit mask of active weekdays, 0 for every day.
    pub weekdays: u8,
    /// Active window in 0..256 phase units; (0, 0) for always.
    pub phase_start: i32,
    pub phase_end: i32,
}

impl Transponder {
    pub fn is_active(&self) -> bool {
        self.uplink_start != 0.0 || self.downlink_start != 0.0
    }

    /// Inverting transponders map the low end of the uplink passband to the
    /// high end of the downlink.
    pub fn is_inverting(&self) -> bool {
        self.uplink_end < self.uplink_start || self.downlink_end < self.downlink_start
    }
}

/// Database entry for one satellite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SatelliteDb {
    pub catalog_number: u32,
    /// Antenna attitude (latitude, longitude) in degrees, for squint.
    pub squint: Option<(f64, f64)>,
    pub transponders: Vec<Transponder>,
}

impl SatelliteDb {
    /// Transponders with at least one frequency set.
    pub fn active(&self) -> impl Iterator<Item = &Transponder> {
        self.transponders.iter().filter(|t| t.is_active())
    }
}

fn is_no(line: &str) -> bool {
    line.starts_with("No")
}

fn is_terminator(line: Option<&str>) -> bool {
    match line {
        None => true,
        Some(line) => line.starts_with("end") || line.trim().is_empty(),
    }
}

/// Parses `"a, b"`, leaving unparsable halves at zero like `sscanf` does.
fn pair<T: std::str::FromStr + Default + Copy>(line: Option<&str>) -> (T, T) {
    let mut parts = line
        .unwrap_or_default()
        .split(',')
        .map(|part| part.trim().parse::<T>().ok());
    let first = parts.next().flatten().unwrap_or_default();
    let second = parts.next().flatten().unwrap_or_default();
    (first, second)
}

/// Parses the transponder database.
///
/// Blocks are a satellite name, catalog number, squint attitude
/// `"alat, alon"` (or `No`), then five line transponder entries
/// (name, uplink range, downlink range, weekday mask, phase window; any
/// optional line may be `No`) until `end`. The file ends at a line
/// starting with `end`, a blank line, or end of file. Entries beyond the
/// tenth of a block are skipped.
pub fn parse_db(content: &str) -> Vec<SatelliteDb> {
    let mut lines = content.lines();
    let mut satellites = Vec::new();

    let mut line = lines.next();
    while !is_terminator(line) {
        let catnum_line = lines.next();
        let Some(catalog_number) = catnum_line.and_then(|l| l.trim().parse::<u32>().ok()) else {
            log::warn!("transponder database: bad catalog number {catnum_line:?}");
            break;
        };

        let squint = match lines.next() {
            Some(l) if !is_no(l) => {
                let (alat, alon) = pair::<f64>(Some(l));
                Some((alat, alon))
            }
            _ => None,
        };

        let mut entry = SatelliteDb {
            catalog_number,
            squint,
            transponders: Vec::new(),
        };

        line = lines.next();
        while !is_terminator(line) {
            let name = line
                .filter(|l| !is_no(l))
                .map(|l| l.trim_end().to_string());
            let (uplink_start, uplink_end) = pair(lines.next());
            let (downlink_start, downlink_end) = pair(lines.next());
            let weekdays = match lines.next() {
                Some(l) if !is_no(l) => l.trim().parse().unwrap_or(0),
                _ => 0,
            };
            let (phase_start, phase_end) = match lines.next() {
                Some(l) if !is_no(l) => pair(Some(l)),
                _ => (0, 0),
            };

            if entry.transponders.len() < MAX_TRANSPONDERS {
                entry.transponders.push(Transponder {
                    name,
                    uplink_start,
                    uplink_end,
                    downlink_start,
                    downlink_end,
                    weekdays,
                    phase_start,
                    phase_end,
                });
            } else {
                log::warn!(
                    "transponder database: more than {MAX_TRANSPONDERS} entries for {catalog_number}"
                );
            }
            line = lines.next();
        }

        satellites.push(entry);
        line = lines.next();
    }

    satellites
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = "\
AO-7
07530
No
Mode A
145.850, 145.950
29.400, 29.500
No
No
Mode B
432.180, 432.120
145.920, 145.980
No
No
end
OSCAR-10
14129
-3.0, 175.0
Mode B
435.030, 435.180
145.975, 145.825
68
0, 128
end
end
";

    #[test]
    fn parses_blocks() {
        let db = parse_db(DB);
        assert_eq!(db.len(), 2);

        let ao7 = &db[0];
        assert_eq!(ao7.catalog_number, 7530);
        assert_eq!(ao7.squint, None);
        assert_eq!(ao7.transponders.len(), 2);
        assert_eq!(ao7.transponders[0].name.as_deref(), Some("Mode A"));
        assert_eq!(ao7.transponders[0].uplink_start, 145.85);
        assert_eq!(ao7.transponders[1].downlink_end, 145.98);
        assert_eq!(ao7.transponders[1].weekdays, 0);

        let ao10 = &db[1];
        assert_eq!(ao10.squint, Some((-3.0, 175.0)));
        let mode_b = &ao10.transponders[0];
        assert_eq!(mode_b.weekdays, 68);
        assert_eq!((mode_b.phase_start, mode_b.phase_end), (0, 128));
        assert!(mode_b.is_inverting());
    }

    #[test]
    fn stops_at_blank_line_or_eof() {
        let truncated = "AO-7\n07530\nNo\nMode A\n145.850, 145.950\n";
        let db = parse_db(truncated);
        assert_eq!(db.len(), 1);
        assert_eq!(db[0].transponders[0].downlink_start, 0.0);

        let blank = "AO-7\n07530\nNo\nend\n\nIGNORED\n1\nNo\nend\n";
        assert_eq!(parse_db(blank).len(), 1);
    }

    #[test]
    fn caps_entries_per_satellite() {
        let mut content = String::from("BUSY\n1\nNo\n");
        for i in 0..12 {
            content.push_str(&format!("T{i}\n145.0, 145.1\n435.0, 435.1\nNo\nNo\n"));
        }
        content.push_str("end\n");
        let db = parse_db(&content);
        assert_eq!(db[0].transponders.len(), MAX_TRANSPONDERS);
        assert_eq!(db[0].active().count(), MAX_TRANSPONDERS);
    }
}
