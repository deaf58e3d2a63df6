//! Calendar command: when each artifact becomes releasable.

use chrono::NaiveDateTime;
use publish_core::config::types::ResolvedConfig;
use publish_core::tree::{UnbuiltArtifact, Universe};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use super::{discover_input, resolve_now};
use crate::CalendarArgs;

/// Row for the calendar table and JSON output.
#[derive(Debug, Tabled, Serialize, PartialEq, Eq)]
pub struct CalendarRow {
    #[tabled(rename = "Release time")]
    pub release_time: String,
    #[tabled(rename = "Collection")]
    pub collection: String,
    #[tabled(rename = "Publication")]
    pub publication: String,
    #[tabled(rename = "Artifact")]
    pub artifact: String,
    #[tabled(rename = "Ready")]
    pub ready: bool,
}

pub fn run(rc: &ResolvedConfig, args: CalendarArgs) {
    let now = resolve_now(args.discover.now.as_deref());
    let universe = discover_input(rc, &args.discover);

    let rows = calendar_rows(&universe, now, args.show_published);

    if args.json {
        match serde_json::to_string_pretty(&rows) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing calendar: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if rows.is_empty() {
        println!("No upcoming releases.");
        return;
    }

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("\nTotal: {} artifacts", rows.len());
}

/// The later of the artifact and publication release times; `now` when
/// neither is set.
fn effective_release_time(
    artifact: Option<NaiveDateTime>,
    publication: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> NaiveDateTime {
    artifact.max(publication).unwrap_or(now)
}

/// Rows sorted by release time, then by key. Rows at or before `now` are
/// left out unless `show_published`.
fn calendar_rows(
    universe: &Universe<UnbuiltArtifact>,
    now: NaiveDateTime,
    show_published: bool,
) -> Vec<CalendarRow> {
    let mut timed: Vec<(NaiveDateTime, CalendarRow)> = universe
        .artifacts()
        .map(|r| {
            let time =
                effective_release_time(r.artifact.release_time, r.publication.release_time, now);
            let row = CalendarRow {
                release_time: time.format("%Y-%m-%d %H:%M:%S").to_string(),
                collection: r.collection_key.to_string(),
                publication: r.publication_key.to_string(),
                artifact: r.artifact_key.to_string(),
                ready: r.publication.ready && r.artifact.ready,
            };
            (time, row)
        })
        .filter(|(time, _)| show_published || *time > now)
        .collect();

    timed.sort_by(|(ta, a), (tb, b)| {
        ta.cmp(tb)
            .then_with(|| a.collection.cmp(&b.collection))
            .then_with(|| a.publication.cmp(&b.publication))
            .then_with(|| a.artifact.cmp(&b.artifact))
    });

    timed.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use publish_core::schema::Schema;
    use publish_core::tree::{Collection, Publication};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 12, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn artifact(release_time: Option<NaiveDateTime>) -> UnbuiltArtifact {
        UnbuiltArtifact {
            workdir: PathBuf::from("/tmp"),
            file: "a.txt".to_string(),
            recipe: None,
            release_time,
            ready: true,
            missing_ok: false,
        }
    }

    fn universe() -> Universe<UnbuiltArtifact> {
        let mut first = Publication::new(
            BTreeMap::new(),
            BTreeMap::from([
                ("homework".to_string(), artifact(None)),
                ("solution".to_string(), artifact(Some(at(16, 23)))),
            ]),
        );
        first.release_time = Some(at(10, 9));

        let second = Publication::new(
            BTreeMap::new(),
            BTreeMap::from([("homework".to_string(), artifact(Some(at(12, 9))))]),
        );

        let mut collection = Collection::new(Schema::permissive());
        collection.publications.insert("01".to_string(), first);
        collection.publications.insert("02".to_string(), second);
        Universe::new(BTreeMap::from([("homeworks".to_string(), collection)]))
    }

    #[test]
    fn test_effective_release_time_is_later_of_both() {
        assert_eq!(effective_release_time(Some(at(16, 0)), Some(at(10, 0)), at(1, 0)), at(16, 0));
        assert_eq!(effective_release_time(Some(at(5, 0)), Some(at(10, 0)), at(1, 0)), at(10, 0));
        assert_eq!(effective_release_time(None, Some(at(10, 0)), at(1, 0)), at(10, 0));
        assert_eq!(effective_release_time(None, None, at(1, 0)), at(1, 0));
    }

    #[test]
    fn test_calendar_rows_sorted_by_time() {
        let rows = calendar_rows(&universe(), at(1, 0), false);
        let order: Vec<_> = rows
            .iter()
            .map(|r| format!("{} {}/{}", r.release_time, r.publication, r.artifact))
            .collect();

        assert_eq!(
            order,
            vec![
                "2020-12-10 09:00:00 01/homework",
                "2020-12-12 09:00:00 02/homework",
                "2020-12-16 23:00:00 01/solution",
            ]
        );
    }

    #[test]
    fn test_calendar_hides_published_unless_asked() {
        let rows = calendar_rows(&universe(), at(14, 0), false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].artifact, "solution");

        assert_eq!(calendar_rows(&universe(), at(14, 0), true).len(), 3);
    }
}
