//! Server statistics line parser
//!
//! The stats endpoint answers with a single comma-separated line:
//!   <load_avg>,<mem_total>,<mem_used>,<disk_total>,<disk_used>,<net_capacity>,<net_used>
//!
//! - memory and disk figures are bytes
//! - network figures are bytes/sec
//!
//! A wrong field count rejects the whole line. A field that is not a
//! non-negative integer is counted and left at 0; whether the snapshot is
//! still usable is the caller's call.

use thiserror::Error;

/// Number of fields a stats line must carry.
pub const FIELD_COUNT: usize = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected field number: {found} (expected {})", FIELD_COUNT)]
    FieldCount { found: usize },
}

/// One parsed stats line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub load_average: u64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub disk_total: u64,
    pub disk_used: u64,
    pub network_capacity: u64,
    pub network_used: u64,
    /// Fields that failed numeric parsing; each of them reads as 0 above.
    pub unparsable_fields: usize,
}

impl MetricsSnapshot {
    /// Human-readable summary for logging
    pub fn summary(&self) -> String {
        format!(
            "load={} mem={}/{} disk={}/{} net={}/{} bad_fields={}",
            self.load_average,
            self.memory_used,
            self.memory_total,
            self.disk_used,
            self.disk_total,
            self.network_used,
            self.network_capacity,
            self.unparsable_fields
        )
    }
}

/// Parse a stats line into a snapshot.
///
/// Segments are trimmed but empty ones are kept, so `"1,,3"` has three fields.
pub fn parse_snapshot(line: &str) -> Result<MetricsSnapshot, ParseError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount { found: parts.len() });
    }

    let mut values = [0u64; FIELD_COUNT];
    let mut unparsable_fields = 0;
    for (slot, part) in values.iter_mut().zip(&parts) {
        match parse_field(part) {
            Some(v) => *slot = v,
            None => unparsable_fields += 1,
        }
    }

    let [
        load_average,
        memory_total,
        memory_used,
        disk_total,
        disk_used,
        network_capacity,
        network_used,
    ] = values;

    Ok(MetricsSnapshot {
        load_average,
        memory_total,
        memory_used,
        disk_total,
        disk_used,
        network_capacity,
        network_used,
        unparsable_fields,
    })
}

/// Plain decimal digits only; signs are rejected.
fn parse_field(field: &str) -> Option<u64> {
    if field.starts_with('+') {
        return None;
    }
    field.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_line() {
        let snapshot = parse_snapshot("10,1000,500,2000,900,3000,500").unwrap();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                load_average: 10,
                memory_total: 1000,
                memory_used: 500,
                disk_total: 2000,
                disk_used: 900,
                network_capacity: 3000,
                network_used: 500,
                unparsable_fields: 0,
            }
        );
    }

    #[test]
    fn test_parse_trims_fields() {
        let snapshot = parse_snapshot(" 1 , 2,3 ,4,\t5,6 ,7").unwrap();
        assert_eq!(snapshot.load_average, 1);
        assert_eq!(snapshot.disk_used, 5);
        assert_eq!(snapshot.network_used, 7);
        assert_eq!(snapshot.unparsable_fields, 0);
    }

    #[test]
    fn test_parse_large_values() {
        let line = format!("0,{},1,1,1,1,1", u64::MAX);
        let snapshot = parse_snapshot(&line).unwrap();
        assert_eq!(snapshot.memory_total, u64::MAX);
    }

    #[test]
    fn test_parse_wrong_field_count() {
        assert_eq!(
            parse_snapshot("1,2,3,4,5,6,7,8"),
            Err(ParseError::FieldCount { found: 8 })
        );
        assert_eq!(
            parse_snapshot("1,2,3,4,5,6"),
            Err(ParseError::FieldCount { found: 6 })
        );
        assert_eq!(parse_snapshot(""), Err(ParseError::FieldCount { found: 1 }));
    }

    #[test]
    fn test_parse_field_count_ignores_content() {
        assert_eq!(
            parse_snapshot("a,b,c,d,e,f,g,h,i"),
            Err(ParseError::FieldCount { found: 9 })
        );
    }

    #[test]
    fn test_parse_empty_segments_are_fields() {
        let snapshot = parse_snapshot("5,,100,1000,,1000,").unwrap();
        assert_eq!(snapshot.unparsable_fields, 3);
        assert_eq!(snapshot.load_average, 5);
        assert_eq!(snapshot.memory_total, 0);
        assert_eq!(snapshot.memory_used, 100);
        assert_eq!(snapshot.disk_used, 0);
        assert_eq!(snapshot.network_used, 0);
    }

    #[test]
    fn test_parse_counts_bad_fields() {
        let snapshot = parse_snapshot("a,b,c,1000,100,1000,50").unwrap();
        assert_eq!(snapshot.unparsable_fields, 3);
        assert_eq!(snapshot.load_average, 0);
        assert_eq!(snapshot.memory_total, 0);
        assert_eq!(snapshot.memory_used, 0);
        assert_eq!(snapshot.disk_total, 1000);
    }

    #[test]
    fn test_parse_all_fields_bad() {
        let snapshot = parse_snapshot("x,y,z,-1,1.5,+2,0x10").unwrap();
        assert_eq!(snapshot.unparsable_fields, 7);
        assert_eq!(
            MetricsSnapshot {
                unparsable_fields: 0,
                ..snapshot
            },
            MetricsSnapshot::default()
        );
    }

    #[test]
    fn test_parse_overflow_is_unparsable() {
        let snapshot = parse_snapshot("18446744073709551616,1,1,1,1,1,1").unwrap();
        assert_eq!(snapshot.unparsable_fields, 1);
        assert_eq!(snapshot.load_average, 0);
    }

    #[test]
    fn test_snapshot_summary() {
        let snapshot = parse_snapshot("45,1000,900,1000,500,1000,500").unwrap();
        let summary = snapshot.summary();
        assert!(summary.contains("load=45"));
        assert!(summary.contains("mem=900/1000"));
        assert!(summary.contains("bad_fields=0"));
    }
}
