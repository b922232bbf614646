use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::label::build_safe_label;
use super::{TrackRecord, UNDETERMINED_LANGUAGE};

/// Matches a subtitle stream header such as
/// `Stream #0:2[0x3](eng): Subtitle: subrip (default)`.
fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^Stream #(?P<id>\d+:\d+)(?:\[0x[0-9a-fA-F]+\])?(?:\((?P<lang>[a-z]{3})\))?: Subtitle: (?P<codec>\w+)(?P<desc>.*?)$",
        )
        .expect("stream header regex is valid")
    })
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"title\s*:\s*(.*)").expect("title regex is valid"))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse the transcoder's stream report into subtitle track records.
///
/// Lines that do not look like a subtitle stream header are skipped. Records
/// come back in report order; `position` is the index within the result.
pub fn parse_stream_report(raw: &str) -> Vec<TrackRecord> {
    let normalized = raw.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let mut tracks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let Some(caps) = header_regex().captures(line.trim()) else {
            i += 1;
            continue;
        };

        let stream_id = caps["id"].to_string();
        let language = caps
            .name("lang")
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string());
        let codec = caps["codec"].to_string();
        let trailing = caps["desc"].trim();

        let (next, title) = scan_title(&lines, i + 1, indent_of(line));

        let description = match title {
            Some(title) => format!("{} - {}", trailing, title),
            None if !trailing.is_empty() => trailing.to_string(),
            None => "Subtitle".to_string(),
        };

        debug!(
            "Found subtitle stream {}: lang={} codec={} desc={}",
            stream_id, language, codec, description
        );

        tracks.push(TrackRecord {
            position: tracks.len(),
            stream_id,
            language,
            codec,
            safe_label: build_safe_label(&description),
            description,
        });

        i = next;
    }

    tracks
}

/// Look through the block of lines indented deeper than `header_indent`,
/// starting at `start`, for a `title:` entry.
///
/// Returns the index of the first line not consumed together with the
/// title, if a non-empty one was found. The scan stops at the title, at the
/// first line that leaves the block, or at end of input.
pub fn scan_title(lines: &[&str], start: usize, header_indent: usize) -> (usize, Option<String>) {
    let mut j = start;

    while j < lines.len() {
        let line = lines[j];
        if line.trim().is_empty() || indent_of(line) <= header_indent {
            break;
        }

        if let Some(caps) = title_regex().captures(line) {
            let title = caps[1].trim();
            return (j + 1, (!title.is_empty()).then(|| title.to_string()));
        }

        j += 1;
    }

    (j, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Input #0, matroska,webm, from 'movie.mkv':\n  Metadata:\n    title           : The Movie\n  Duration: 01:42:17.02, start: 0.000000, bitrate: 4410 kb/s\n  Stream #0:0: Video: h264 (High), yuv420p(progressive), 1920x1080\n  Stream #0:1(eng): Audio: aac (LC), 48000 Hz, stereo, fltp (default)\n  Stream #0:2(eng): Subtitle: subrip (default)\n    Metadata:\n      BPS             : 61\n      title           : English\n  Stream #0:3(jpn): Subtitle: ass\n    Metadata:\n      title           : Signs & Songs\n  Stream #0:4: Subtitle: hdmv_pgs_subtitle\n";

    #[test]
    fn test_parse_full_report() {
        let tracks = parse_stream_report(REPORT);
        assert_eq!(tracks.len(), 3);

        assert_eq!(tracks[0].stream_id, "0:2");
        assert_eq!(tracks[0].language, "eng");
        assert_eq!(tracks[0].codec, "subrip");
        assert_eq!(tracks[0].description, "(default) - English");
        assert_eq!(tracks[0].safe_label, "_default__-_English");

        assert_eq!(tracks[1].stream_id, "0:3");
        assert_eq!(tracks[1].description, " - Signs & Songs");

        assert_eq!(tracks[2].language, "und");
        assert_eq!(tracks[2].description, "Subtitle");
        assert_eq!(
            tracks.iter().map(|t| t.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let report = REPORT.replace('\n', "\r\n");
        assert_eq!(parse_stream_report(&report), parse_stream_report(REPORT));
    }

    #[test]
    fn test_no_subtitles() {
        let report = "  Stream #0:0: Video: h264\n  Stream #0:1(eng): Audio: aac\n";
        assert!(parse_stream_report(report).is_empty());
        assert!(parse_stream_report("").is_empty());
    }

    #[test]
    fn test_title_from_second_indented_line() {
        let report = "  Stream #0:5(eng): Subtitle: subrip (forced)\n    Metadata:\n      title: Director's Commentary\n";
        let tracks = parse_stream_report(report);
        assert!(tracks[0].description.ends_with(" - Director's Commentary"));
    }

    #[test]
    fn test_title_does_not_leak_from_next_stream() {
        let report = "  Stream #0:2(eng): Subtitle: subrip\n  Stream #0:3(fre): Subtitle: subrip\n    Metadata:\n      title           : French\n";
        let tracks = parse_stream_report(report);
        assert_eq!(tracks[0].description, "Subtitle");
        assert_eq!(tracks[1].description, " - French");
    }

    #[test]
    fn test_hex_stream_id_suffix() {
        let report = "  Stream #0:4[0x5](ger): Subtitle: dvd_subtitle (dvdsub)\n";
        let tracks = parse_stream_report(report);
        assert_eq!(tracks[0].stream_id, "0:4");
        assert_eq!(tracks[0].language, "ger");
        assert_eq!(tracks[0].codec, "dvd_subtitle");
        assert_eq!(tracks[0].description, "(dvdsub)");
    }

    #[test]
    fn test_scan_title_stops_at_block_end() {
        let lines = ["  Stream #0:2: Subtitle: ass", "    Metadata:", "  Stream #0:3: Subtitle: ass", "      title : Late"];
        assert_eq!(scan_title(&lines, 1, 2), (2, None));
    }

    #[test]
    fn test_scan_title_empty_value() {
        let lines = ["Stream #0:2: Subtitle: ass", "    title :   "];
        assert_eq!(scan_title(&lines, 1, 0), (2, None));
    }
}
