// Parser for `mtr --raw` output
//
// Raw mode prints one record per line: `<type> <hop> <payload>`, where hop
// numbers start at 0. Records for different hops arrive interleaved, so hops
// are collected into a table first and published in order once the whole
// output has been read.

use std::collections::BTreeMap;

use super::HopRecord;

/// Highest hop number mtr can report (TTL is a single byte)
const MAX_HOP_NUMBER: u32 = u8::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Host,
    Ping,
    Dns,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RawRecord<'a> {
    kind: RecordKind,
    hop: u32,
    payload: &'a str,
}

#[derive(Debug, Default)]
struct HopEntry {
    ip: Option<String>,
    hostname: Option<String>,
    rtts: Vec<f64>,
}

impl HopEntry {
    fn into_record(self, number: u32) -> HopRecord {
        HopRecord {
            number,
            ip: self.ip,
            hostname: self.hostname,
            rtts: self.rtts,
        }
    }
}

/// Parse the complete stdout of one mtr run into hops ordered by number.
///
/// Malformed lines are skipped. Once `target` answers a hop (past the first
/// one), records for later hops are ignored. Hop positions without any record
/// are filled with empty hops so the result has no gaps.
pub fn parse_raw_output(output: &str, target: &str) -> Vec<HopRecord> {
    let mut table: BTreeMap<u32, HopEntry> = BTreeMap::new();
    let mut target_hop: Option<u32> = None;

    for line in output.lines() {
        let Some(record) = parse_record(line) else {
            continue;
        };

        if target_hop.is_some_and(|cutoff| record.hop > cutoff) {
            continue;
        }

        let entry = table.entry(record.hop).or_default();

        match record.kind {
            RecordKind::Host => {
                entry.ip = Some(record.payload.to_string());

                // A target answering the very first hop is a loopback or
                // directly attached host; mtr still reports the following
                // hop for it, so the cutoff only starts past hop 0.
                if record.payload == target && record.hop > 0 && target_hop.is_none() {
                    target_hop = Some(record.hop);
                }
            }
            RecordKind::Ping => match record.payload.parse::<u64>() {
                Ok(micros) => entry.rtts.push(micros as f64 / 1000.0),
                Err(_) => {
                    tracing::debug!(
                        "Skipping malformed ping sample for hop {}: {:?}",
                        record.hop,
                        record.payload
                    );
                }
            },
            RecordKind::Dns => {
                entry.hostname = Some(record.payload.to_string());
            }
        }
    }

    let Some(&max_hop) = table.keys().next_back() else {
        return Vec::new();
    };

    let hops: Vec<HopRecord> = (0..=max_hop)
        .map(|hop| match table.remove(&hop) {
            Some(entry) => entry.into_record(hop + 1),
            None => HopRecord::empty(hop + 1),
        })
        .collect();

    tracing::debug!(
        "Parsed {} hop(s) from mtr output (target reached at {:?})",
        hops.len(),
        target_hop.map(|hop| hop + 1)
    );

    hops
}

/// Split one line into a record. Only the first three tokens matter; some
/// platforms append extra fields to ping records.
fn parse_record(line: &str) -> Option<RawRecord<'_>> {
    let mut tokens = line.split_whitespace();
    let kind = tokens.next()?;
    let hop = tokens.next()?;
    let payload = tokens.next()?;

    let kind = match kind {
        "h" => RecordKind::Host,
        "p" => RecordKind::Ping,
        "d" => RecordKind::Dns,
        _ => return None,
    };

    let hop = hop.parse::<u32>().ok().filter(|hop| *hop <= MAX_HOP_NUMBER)?;

    Some(RawRecord { kind, hop, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_output() {
        assert!(parse_raw_output("", "8.8.8.8").is_empty());
        assert!(parse_raw_output("\n  \n", "8.8.8.8").is_empty());
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(
            parse_record("  h 3 10.0.0.1  "),
            Some(RawRecord {
                kind: RecordKind::Host,
                hop: 3,
                payload: "10.0.0.1"
            })
        );
        assert_eq!(
            parse_record("p 0 1234 57").map(|r| (r.kind, r.payload)),
            Some((RecordKind::Ping, "1234"))
        );
        assert_eq!(parse_record("h 3"), None);
        assert_eq!(parse_record("x 0 33000"), None);
        assert_eq!(parse_record("h -1 10.0.0.1"), None);
        assert_eq!(parse_record("h one 10.0.0.1"), None);
        assert_eq!(parse_record("h 256 10.0.0.1"), None);
    }

    #[test]
    fn test_fields_are_applied_per_hop() {
        let output = "h 0 192.168.1.1\n\
                      p 0 1500\n\
                      h 1 10.0.0.1\n\
                      p 1 5250\n\
                      p 0 1700\n\
                      d 1 core1.example.net\n";

        let hops = parse_raw_output(output, "8.8.8.8");
        assert_eq!(hops.len(), 2);

        assert_eq!(hops[0].number, 1);
        assert_eq!(hops[0].ip.as_deref(), Some("192.168.1.1"));
        assert_eq!(hops[0].hostname, None);
        assert_eq!(hops[0].rtts, vec![1.5, 1.7]);

        assert_eq!(hops[1].number, 2);
        assert_eq!(hops[1].hostname.as_deref(), Some("core1.example.net"));
        assert_eq!(hops[1].rtts, vec![5.25]);
    }

    #[test]
    fn test_last_host_and_dns_line_wins() {
        let output = "h 0 10.0.0.1\nd 0 a.example\nh 0 10.0.0.2\nd 0 b.example\n";
        let hops = parse_raw_output(output, "8.8.8.8");
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(hops[0].hostname.as_deref(), Some("b.example"));
    }

    #[test]
    fn test_gaps_are_filled_with_empty_hops() {
        let output = "h 0 10.0.0.1\np 0 1000\nh 3 10.0.0.4\np 3 4000\n";
        let hops = parse_raw_output(output, "8.8.8.8");

        let numbers: Vec<u32> = hops.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(hops[1], HopRecord::empty(2));
        assert_eq!(hops[2], HopRecord::empty(3));
        assert_eq!(hops[3].rtts, vec![4.0]);
    }

    #[test]
    fn test_hop_with_only_pings_has_no_ip() {
        let hops = parse_raw_output("p 0 2000\n", "8.8.8.8");
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].ip, None);
        assert_eq!(hops[0].rtts, vec![2.0]);
    }

    #[test]
    fn test_lines_past_target_are_discarded() {
        let output = "h 0 10.0.0.1\n\
                      h 1 8.8.8.8\n\
                      p 1 9000\n\
                      h 2 8.8.8.8\n\
                      p 2 9100\n\
                      d 3 late.example\n\
                      p 1 9200\n";

        let hops = parse_raw_output(output, "8.8.8.8");
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[1].number, 2);
        assert_eq!(hops[1].ip.as_deref(), Some("8.8.8.8"));
        assert_eq!(hops[1].rtts, vec![9.0, 9.2]);
    }

    #[test]
    fn test_lines_before_target_answer_are_kept() {
        // Hop 2 shows up before the target answers at hop 1
        let output = "h 2 9.9.9.9\nh 1 8.8.8.8\np 2 3000\n";
        let hops = parse_raw_output(output, "8.8.8.8");
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[2].ip.as_deref(), Some("9.9.9.9"));
        assert!(hops[2].rtts.is_empty());
    }

    #[test]
    fn test_target_match_is_exact() {
        let output = "h 0 10.0.0.1\nh 1 2001:DB8::1\nh 2 2001:db8::1\n";
        let hops = parse_raw_output(output, "2001:db8::1");
        assert_eq!(hops.len(), 3);

        let output = "h 0 10.0.0.1\nh 1 2001:db8::1\nh 2 2001:db8::1\n";
        let hops = parse_raw_output(output, "2001:db8::1");
        assert_eq!(hops.len(), 2);
    }

    #[test]
    fn test_target_at_first_hop_does_not_cut_off() {
        let output = "h 0 127.0.0.1\np 0 80\nh 1 127.0.0.1\np 1 28000\nh 2 127.0.0.1\n";
        let hops = parse_raw_output(output, "127.0.0.1");
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[1].rtts, vec![28.0]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "mtr: garbage\n\
                      h 0\n\
                      x 5 33000\n\
                      h 0 10.0.0.1\n\
                      p 0 abc\n\
                      p 0 -5\n\
                      p 0 1200 extra tokens\n";

        let hops = parse_raw_output(output, "8.8.8.8");
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(hops[0].rtts, vec![1.2]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let output = "h 1 10.0.0.2\np 0 1000\nh 0 10.0.0.1\np 1 2000\nh 4 8.8.8.8\n";
        assert_eq!(
            parse_raw_output(output, "8.8.8.8"),
            parse_raw_output(output, "8.8.8.8")
        );
    }

    #[test]
    fn test_rtts_stay_with_their_hop() {
        let output = "p 0 1000\np 1 2000\np 0 3000\np 2 4000\np 1 5000\n";
        let hops = parse_raw_output(output, "8.8.8.8");
        assert_eq!(hops[0].rtts, vec![1.0, 3.0]);
        assert_eq!(hops[1].rtts, vec![2.0, 5.0]);
        assert_eq!(hops[2].rtts, vec![4.0]);
    }
}
