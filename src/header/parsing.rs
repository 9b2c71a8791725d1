//! Header section parsing
use crate::{
    epoch::parse_in_timescale,
    error::Error,
    gnss_time::TimeSystem,
    header::Header,
    observable::Observable,
    version::Version,
};

use gnss::prelude::Constellation;
use hifitime::{Duration, Epoch, TimeScale};
use std::{collections::HashMap, io::BufRead, str::FromStr};

use log::{debug, warn};

/// Column splits can land inside a multi byte character on
/// rubbish input: that must surface as an error, not a panic.
fn split_columns(content: &str, mid: usize) -> Option<(&str, &str)> {
    content.is_char_boundary(mid).then(|| content.split_at(mid))
}

impl Header {
    /// Parses [Header] by consuming given reader until the
    /// END OF HEADER marker. Returns Self along with the number
    /// of lines consumed, so record parsing can report meaningful
    /// file positions. Unrecognized header labels are ignored.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<(Self, usize), Error> {
        let mut version = Option::<Version>::None;
        let mut is_observation = false;
        let mut constellation = Option::<Constellation>::None;

        let mut program = Option::<String>::None;
        let mut run_by = Option::<String>::None;
        let mut marker_name = Option::<String>::None;

        let mut codes: HashMap<Constellation, Vec<Observable>> = HashMap::new();
        let mut current_constell = Option::<Constellation>::None;

        let mut rx_position = Option::<(f64, f64, f64)>::None;
        let mut leap_seconds = Option::<u32>::None;
        let mut time_system = Option::<TimeSystem>::None;
        let mut timeof_first_obs = Option::<Epoch>::None;
        let mut timeof_last_obs = Option::<Epoch>::None;
        let mut interval = Option::<Duration>::None;

        let mut line_no = 0_usize;
        let mut terminated = false;
        let mut line = String::with_capacity(128);

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break; // EOF
            }
            line_no += 1;

            let trimmed = line.trim_end();
            if trimmed.len() < 61 {
                // too short to carry a label: only the terminator
                // is tolerated in this form
                if trimmed.trim().ends_with("END OF HEADER") {
                    terminated = true;
                    break;
                }
                continue;
            }

            let Some((content, marker)) = split_columns(trimmed, 60) else {
                return Err(
                    Error::malformed_header("invalid character encoding").at_line(line_no)
                );
            };
            let marker = marker.trim();

            if marker.eq("END OF HEADER") {
                terminated = true;
                break;
            }

            if marker.eq("COMMENT") {
                continue;
            } else if marker.contains("RINEX VERSION / TYPE") {
                let bad_encoding =
                    || Error::malformed_header("invalid character encoding").at_line(line_no);
                let (vers, rem) = split_columns(content, 20).ok_or_else(bad_encoding)?;
                let (type_str, constell_str) = split_columns(rem, 20).ok_or_else(bad_encoding)?;

                let parsed = Version::from_str(vers.trim()).map_err(|_| {
                    Error::malformed_header("unparseable revision").at_line(line_no)
                })?;
                if !parsed.is_supported() {
                    return Err(Error::malformed_header(&format!(
                        "non supported revision \"{}\"",
                        parsed
                    ))
                    .at_line(line_no));
                }
                version = Some(parsed);

                if !type_str.trim().starts_with('O') {
                    return Err(Error::malformed_header(&format!(
                        "not an observation file: \"{}\"",
                        type_str.trim()
                    ))
                    .at_line(line_no));
                }
                is_observation = true;

                if let Ok(c) = Constellation::from_str(constell_str.trim()) {
                    constellation = Some(c);
                }
            } else if marker.contains("PGM / RUN BY / DATE") {
                let Some((pgm, rem)) = split_columns(content, 20) else {
                    warn!("line {}: unsplittable production fields", line_no);
                    continue;
                };
                let Some((runby, _)) = split_columns(rem, 20) else {
                    warn!("line {}: unsplittable production fields", line_no);
                    continue;
                };
                if !pgm.trim().is_empty() {
                    program = Some(pgm.trim().to_string());
                }
                if !runby.trim().is_empty() {
                    run_by = Some(runby.trim().to_string());
                }
            } else if marker.contains("MARKER NAME") {
                let name = content.trim();
                if !name.is_empty() {
                    marker_name = Some(name.to_string());
                }
            } else if marker.contains("SYS / # / OBS TYPES") {
                let (system, rem) = split_columns(content, 1).ok_or_else(|| {
                    Error::malformed_header("invalid character encoding").at_line(line_no)
                })?;
                if !system.trim().is_empty() {
                    // new system description
                    let constell = Constellation::from_str(system).map_err(|_| {
                        Error::malformed_header(&format!("unknown system \"{}\"", system))
                            .at_line(line_no)
                    })?;
                    current_constell = Some(constell);
                }
                let constell = current_constell.ok_or_else(|| {
                    Error::malformed_header("dangling observable continuation").at_line(line_no)
                })?;
                // first line carries the count in columns 3..6,
                // continuations are blank there: both split fine
                let (_count, list) = split_columns(rem, 5).ok_or_else(|| {
                    Error::malformed_header("invalid character encoding").at_line(line_no)
                })?;
                let entry = codes.entry(constell).or_default();
                for code in list.split_ascii_whitespace() {
                    let observable =
                        Observable::from_str(code).map_err(|e| e.at_line(line_no))?;
                    entry.push(observable);
                }
            } else if marker.contains("APPROX POSITION XYZ") {
                let mut items = content.split_ascii_whitespace();
                let (x, y, z) = (items.next(), items.next(), items.next());
                if let (Some(x), Some(y), Some(z)) = (x, y, z) {
                    match (x.parse::<f64>(), y.parse::<f64>(), z.parse::<f64>()) {
                        (Ok(x), Ok(y), Ok(z)) => {
                            rx_position = Some((x, y, z));
                        },
                        _ => {
                            warn!("unparseable approx position \"{}\"", content.trim());
                        },
                    }
                }
            } else if marker.contains("INTERVAL") {
                if let Ok(secs) = content.trim().parse::<f64>() {
                    if secs > 0.0 {
                        interval = Some(Duration::from_seconds(secs));
                    }
                }
            } else if marker.contains("LEAP SECONDS") {
                if let Some((count, _)) = split_columns(content, 6) {
                    if let Ok(count) = count.trim().parse::<u32>() {
                        leap_seconds = Some(count);
                    }
                }
            } else if marker.contains("TIME OF FIRST OBS") || marker.contains("TIME OF LAST OBS") {
                let items: Vec<&str> = content.split_ascii_whitespace().collect();
                if items.len() < 6 {
                    return Err(Error::malformed_header(&format!(
                        "unparseable \"{}\"",
                        marker
                    ))
                    .at_line(line_no));
                }
                let declared = items
                    .get(6)
                    .and_then(|label| TimeSystem::from_str(label).ok());
                if time_system.is_none() {
                    time_system = declared;
                }
                let ts = time_system
                    .map(|ts| ts.timescale())
                    .unwrap_or(TimeScale::GPST);
                let datetime = items[..6].join(" ");
                let epoch = parse_in_timescale(&datetime, ts).map_err(|e| e.at_line(line_no))?;
                if marker.contains("FIRST") {
                    timeof_first_obs = Some(epoch);
                } else {
                    timeof_last_obs = Some(epoch);
                }
            } else {
                // unrecognized labels: forward compatibility
                debug!("ignored header label \"{}\"", marker);
            }
        }

        if !terminated {
            return Err(Error::malformed_header("END OF HEADER never found").at_line(line_no));
        }

        let version = version.ok_or_else(|| {
            Error::malformed_header("missing RINEX VERSION / TYPE").at_line(line_no)
        })?;

        if !is_observation {
            return Err(Error::malformed_header("missing file type").at_line(line_no));
        }

        Ok((
            Self {
                version,
                constellation,
                program,
                run_by,
                marker_name,
                codes,
                rx_position,
                leap_seconds,
                time_system,
                timeof_first_obs,
                timeof_last_obs,
                interval,
            },
            line_no,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::BufReader;

    // first line starts on the quote: a "\" continuation would
    // strip the leading columns the 60/20 split depends on
    const HEADER: &str = "     3.01           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE
sbf2rin-9.3.3                           20180513 013006 UTC PGM / RUN BY / DATE
ABMF                                                        MARKER NAME
  4789028.4701   176610.0133  4195017.0310                  APPROX POSITION XYZ
G    8 C1C L1C S1C C2P L2P S2P C2W S2W                      SYS / # / OBS TYPES
R    5 C1P C2P L2P S1P S1C                                  SYS / # / OBS TYPES
E   15 C1C L1C S1C C5Q L5Q S5Q C7Q L7Q S7Q C8Q L8Q S8Q C6C  SYS / # / OBS TYPES
       L6C S6C                                              SYS / # / OBS TYPES
    30.000                                                  INTERVAL
    18                                                      LEAP SECONDS
  2018    05    13    01    30   30.0000000     GPS         TIME OF FIRST OBS
                                                            END OF HEADER
";

    #[test]
    fn nominal_header() {
        // column sensitive: the version line keeps its leading blanks
        assert!(HEADER.starts_with("     3.01"));

        let mut reader = BufReader::new(HEADER.as_bytes());
        let (header, lines) = Header::parse(&mut reader).unwrap();
        assert_eq!(lines, 12);

        assert_eq!(header.version.major, 3);
        assert_eq!(header.version.minor, 1);
        assert_eq!(header.constellation, Some(Constellation::Mixed));
        assert_eq!(header.program.as_deref(), Some("sbf2rin-9.3.3"));
        assert_eq!(header.marker_name.as_deref(), Some("ABMF"));
        assert_eq!(header.leap_seconds, Some(18));
        assert_eq!(header.interval, Some(Duration::from_seconds(30.0)));
        assert_eq!(header.time_system, Some(TimeSystem::GPS));
        assert_eq!(header.timescale(), TimeScale::GPST);

        let (x, y, z) = header.rx_position.unwrap();
        assert_eq!((x, y, z), (4789028.4701, 176610.0133, 4195017.0310));

        assert_eq!(
            header.timeof_first_obs,
            Some(Epoch::from_gregorian(
                2018,
                5,
                13,
                1,
                30,
                30,
                0,
                TimeScale::GPST
            ))
        );

        // per system layouts, continuation included
        assert_eq!(header.codes.len(), 3);
        assert_eq!(header.codes[&Constellation::GPS].len(), 8);
        assert_eq!(header.codes[&Constellation::Glonass].len(), 5);
        let gal = &header.codes[&Constellation::Galileo];
        assert_eq!(gal.len(), 15);
        assert_eq!(gal[0].code(), "C1C");
        assert_eq!(gal[13].code(), "L6C");
        assert_eq!(gal[14].code(), "S6C");
        assert_eq!(header.num_codes(), 28);
    }

    #[test]
    fn non_ascii_label_split() {
        // a multi byte character straddling column 60 must not panic
        let content = format!(
            "     3.01           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE\n{:<59}éMARKER NAME\n",
            "ACME"
        );
        let mut reader = BufReader::new(content.as_bytes());
        let err = Header::parse(&mut reader);
        assert!(matches!(err, Err(Error::MalformedHeader { line: 2, .. })));
    }

    #[test]
    fn missing_terminator() {
        let content = HEADER.lines().take(10).collect::<Vec<_>>().join("\n");
        let mut reader = BufReader::new(content.as_bytes());
        let err = Header::parse(&mut reader);
        assert!(matches!(err, Err(Error::MalformedHeader { .. })));
    }

    #[test]
    fn missing_version() {
        let content = "                                                            END OF HEADER
";
        let mut reader = BufReader::new(content.as_bytes());
        let err = Header::parse(&mut reader);
        assert!(matches!(err, Err(Error::MalformedHeader { .. })));
    }

    #[test]
    fn non_supported_revision() {
        let content = "     2.11           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE
                                                            END OF HEADER
";
        let mut reader = BufReader::new(content.as_bytes());
        let err = Header::parse(&mut reader);
        assert!(matches!(err, Err(Error::MalformedHeader { line: 1, .. })));
    }

    #[test]
    fn navigation_file_rejected() {
        let content = "     3.04           NAVIGATION DATA     M                   RINEX VERSION / TYPE
                                                            END OF HEADER
";
        let mut reader = BufReader::new(content.as_bytes());
        let err = Header::parse(&mut reader);
        assert!(matches!(err, Err(Error::MalformedHeader { .. })));
    }
}
