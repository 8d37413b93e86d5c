//! Command handlers and plain-text rendering for the CLI.
//!
//! Rendering lives in `Display` wrappers, split from fetching so the table
//! layout can be tested without a network.

use std::fmt;

use fsdash_core::{
    apply_filter, summarize, FilterPredicate, ServiceKind, ServiceRecord, ServiceSummary,
};
use fsdash_feed::{FeedClient, FeedError, FeedProbe, RecordSource};

/// Column text for an empty field.
const EMPTY: &str = "-";

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        EMPTY
    } else {
        value
    }
}

/// Fixed-width table of one kind's records.
pub(crate) struct RecordsTable<'a> {
    pub kind: ServiceKind,
    pub records: &'a [ServiceRecord],
}

impl fmt::Display for RecordsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.kind.label(), self.records.len())?;
        writeln!(
            f,
            "{:<8}{:<24}{:<10}{:<14}ADDRESS",
            "ID", "NAME", "DISTRICT", "PHONE"
        )?;
        for record in self.records {
            writeln!(
                f,
                "{:<8}{:<24}{:<10}{:<14}{}",
                record.id,
                or_dash(&record.name),
                or_dash(&record.district),
                or_dash(&record.phone),
                or_dash(&record.address),
            )?;
        }
        Ok(())
    }
}

/// Headline totals followed by the per-district table.
pub(crate) struct SummaryReport<'a>(pub &'a ServiceSummary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let totals = &summary.totals;
        writeln!(
            f,
            "Ambulance depots: {} in {} districts",
            totals.ambulance_total, totals.ambulance_districts
        )?;
        writeln!(
            f,
            "Fire stations:    {} in {} districts",
            totals.fire_station_total, totals.fire_station_districts
        )?;
        if let Some(combined) = totals.combined_total {
            writeln!(f, "Combined:         {combined}")?;
        }
        writeln!(f, "Districts:        {}", totals.distinct_districts)?;
        writeln!(f)?;
        writeln!(f, "{:<12}{:>10}{:>10}{:>8}", "DISTRICT", "AMBULANCE", "FIRE", "TOTAL")?;
        for (district, counts) in &summary.districts {
            writeln!(
                f,
                "{:<12}{:>10}{:>10}{:>8}",
                district,
                counts.ambulance_count,
                counts.fire_station_count,
                counts.total()
            )?;
        }
        Ok(())
    }
}

pub(crate) struct ProbeReport<'a>(pub &'a FeedProbe);

impl fmt::Display for ProbeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let probe = self.0;
        writeln!(f, "{}: HTTP {}", probe.kind.label(), probe.status)?;
        writeln!(f, "  url:      {}", probe.url)?;
        writeln!(f, "  features: {}", probe.feature_count)?;
        writeln!(f, "  elapsed:  {} ms", probe.elapsed.as_millis())?;
        for (name, district) in &probe.samples {
            writeln!(f, "  - {name} ({district})")?;
        }
        Ok(())
    }
}

/// Fetches one kind, filters it and prints a table or JSON.
///
/// # Errors
///
/// Returns an error if the feed cannot be fetched or JSON output fails.
pub(crate) async fn run_records<S: RecordSource>(
    source: &S,
    kind: ServiceKind,
    predicate: &FilterPredicate,
    json: bool,
) -> anyhow::Result<()> {
    let records = source.fetch_records(kind).await?;
    let filtered = apply_filter(&records, predicate);
    tracing::debug!(%kind, fetched = records.len(), shown = filtered.len(), "records filtered");

    if json {
        println!("{}", serde_json::to_string_pretty(&filtered)?);
    } else {
        print!(
            "{}",
            RecordsTable {
                kind,
                records: &filtered,
            }
        );
    }
    Ok(())
}

/// Fetches both kinds and prints the district summary.
///
/// A kind that fails to load is reported on stderr and counted as empty.
///
/// # Errors
///
/// Returns an error only when both feeds fail, or when JSON output fails.
pub(crate) async fn run_summary<S: RecordSource>(source: &S, json: bool) -> anyhow::Result<()> {
    let mut failures = 0;
    let mut load = |result: Result<Vec<ServiceRecord>, FeedError>, kind: ServiceKind| {
        result.unwrap_or_else(|e| {
            failures += 1;
            eprintln!("warning: {} unavailable: {e}", kind.label());
            Vec::new()
        })
    };
    let ambulance = load(
        source.fetch_records(ServiceKind::AmbulanceDepot).await,
        ServiceKind::AmbulanceDepot,
    );
    let fire_stations = load(
        source.fetch_records(ServiceKind::FireStation).await,
        ServiceKind::FireStation,
    );

    if failures == ServiceKind::ALL.len() {
        anyhow::bail!("both feeds are unavailable");
    }

    let summary = summarize(&ambulance, &fire_stations);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", SummaryReport(&summary));
    }
    Ok(())
}

/// Probes both feeds and prints what came back.
///
/// # Errors
///
/// Returns an error if any feed failed, after reporting every kind.
pub(crate) async fn run_probe(client: &FeedClient) -> anyhow::Result<()> {
    let mut failed = Vec::new();
    for kind in ServiceKind::ALL {
        match client.probe(kind).await {
            Ok(probe) => print!("{}", ProbeReport(&probe)),
            Err(e) => {
                println!("{}: FAILED ({:?}) {e}", kind.label(), e.category());
                failed.push(kind.as_str());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("probe failed for: {}", failed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use fsdash_core::{DistrictCounts, SummaryTotals};

    use super::*;

    fn record(id: i64, name: &str, district: &str) -> ServiceRecord {
        ServiceRecord {
            id,
            agency_code: String::new(),
            name: name.to_owned(),
            name_en: String::new(),
            address: String::new(),
            address_en: String::new(),
            district: district.to_owned(),
            district_en: String::new(),
            phone: "2723 3233".to_owned(),
            latitude: None,
            longitude: None,
            kind: ServiceKind::FireStation,
        }
    }

    #[test]
    fn records_table_has_heading_header_and_one_line_per_record() {
        let records = [record(1, "灣仔消防局", "灣仔"), record(2, "柴灣消防局", "東區")];
        let out = RecordsTable {
            kind: ServiceKind::FireStation,
            records: &records,
        }
        .to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Fire stations (2)");
        assert!(lines[1].starts_with("ID"));
        assert!(lines[2].contains("灣仔消防局"));
        assert!(lines[3].contains("東區"));
    }

    #[test]
    fn empty_fields_render_as_dash() {
        let records = [record(1, "", "")];
        let out = RecordsTable {
            kind: ServiceKind::FireStation,
            records: &records,
        }
        .to_string();
        let row = out.lines().nth(2).unwrap();
        assert!(row.contains(EMPTY));
        assert!(row.ends_with(EMPTY), "empty address renders as dash: {row}");
    }

    #[test]
    fn summary_omits_combined_line_when_absent() {
        let summary = ServiceSummary {
            districts: BTreeMap::from([(
                "灣仔".to_owned(),
                DistrictCounts {
                    ambulance_count: 0,
                    fire_station_count: 2,
                },
            )]),
            totals: SummaryTotals {
                ambulance_total: 0,
                fire_station_total: 2,
                ambulance_districts: 0,
                fire_station_districts: 1,
                distinct_districts: 1,
                combined_total: None,
                ambulance_centroid: None,
                fire_station_centroid: None,
            },
        };

        let out = SummaryReport(&summary).to_string();

        assert!(!out.contains("Combined"));
        assert!(out.contains("Fire stations:    2 in 1 districts"));
        let row = out.lines().last().unwrap();
        assert!(row.starts_with("灣仔"));
        assert!(row.trim_end().ends_with('2'));
    }

    #[test]
    fn probe_lists_samples() {
        let probe = FeedProbe {
            kind: ServiceKind::AmbulanceDepot,
            url: "http://feed.test/ambulance".to_owned(),
            status: 200,
            feature_count: 38,
            elapsed: Duration::from_millis(420),
            samples: vec![("九龍救護站".to_owned(), "油尖旺".to_owned())],
        };

        let out = ProbeReport(&probe).to_string();

        assert!(out.starts_with("Ambulance depots: HTTP 200"));
        assert!(out.contains("features: 38"));
        assert!(out.contains("elapsed:  420 ms"));
        assert!(out.contains("- 九龍救護站 (油尖旺)"));
    }
}
