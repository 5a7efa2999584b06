// Included into the library's test build from lib.rs.

use std::time::Instant;

use crate::fuzzy::FuzzyScorer;
use crate::model::{AppEntry, ResultEntry};
use crate::normalizer::normalize;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

fn score_universe(scorer: &FuzzyScorer, entries: &[ResultEntry]) -> usize {
    entries
        .iter()
        .filter(|entry| {
            entry
                .match_fields()
                .iter()
                .any(|field| scorer.score(field).is_some())
        })
        .count()
}

#[test]
fn warm_query_p95_under_15ms() {
    let mut entries: Vec<ResultEntry> = (0..10_000)
        .map(|i| {
            ResultEntry::App(AppEntry::new(
                &format!("app-{i:05}"),
                &format!("Utility Tool {i:05}"),
                &format!("/usr/bin/utility-{i:05}"),
                &[],
            ))
        })
        .collect();

    entries.push(ResultEntry::App(AppEntry::new(
        "app-camera",
        "Camera",
        "/usr/bin/camera",
        &[],
    )));

    let scorer = FuzzyScorer::new(&normalize("camra"));
    for _ in 0..30 {
        let _ = score_universe(&scorer, &entries);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            let matched = score_universe(&scorer, &entries);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
            assert!(matched >= 1);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 15.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 15.0ms); batches={batch_p95:?}",
    );
}
