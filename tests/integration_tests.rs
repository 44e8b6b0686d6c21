use std::fs;
use std::sync::Mutex;

use anyhow::Result;
use listing_rater::clock::FixedClock;
use listing_rater::config::{RunConfig, SearchConfig};
use listing_rater::error::ValidationError;
use listing_rater::pipeline::run;
use listing_rater::services::search_api::{SearchApi, SearchQuery};
use serde_json::{Value, json};
use tempfile::tempdir;

/// Serves a fixed listing set, one page per request, honoring limit/offset.
struct FakeSearch {
    listings: Vec<Value>,
    calls: Mutex<u32>,
}

impl FakeSearch {
    fn new(listings: Vec<Value>) -> Self {
        Self {
            listings,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl SearchApi for FakeSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Value> {
        *self.calls.lock().unwrap() += 1;
        let page: Vec<Value> = self
            .listings
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(json!({
            "businesses": page,
            "total": self.listings.len(),
            "region": {"center": {"latitude": 34.05, "longitude": -118.24}}
        }))
    }
}

fn listing(id: &str, rating: f64, review_count: u64) -> Value {
    json!({
        "id": id,
        "name": format!("{id} animal hospital"),
        "url": format!("https://www.example.com/biz/{id}"),
        "rating": rating,
        "review_count": review_count,
        "phone": "+15555550100"
    })
}

fn listings() -> Vec<Value> {
    vec![
        listing("steady", 4.9, 2500),
        listing("loved", 4.8, 300),
        listing("solid", 4.6, 400),
        listing("fine", 4.5, 900),
        listing("okay", 4.4, 400),
        listing("fresh", 5.0, 4),
        listing("meh", 3.5, 80),
        listing("unknown", 0.0, 0),
    ]
}

fn config() -> SearchConfig {
    SearchConfig::new("test-key", "Los Angeles, CA")
        .with_page_size(3)
        .unwrap()
}

fn run_config(dir: &std::path::Path) -> RunConfig {
    RunConfig {
        output_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_pipeline() {
    let dir = tempdir().unwrap();
    let clock = FixedClock("2024-05-01-17-03-09".to_string());
    let run_config = run_config(dir.path());
    let api = FakeSearch::new(listings());

    let tiering = run(|| Ok((&api, config())), &run_config, &clock)
        .await
        .unwrap();
    assert_eq!(api.calls(), 3);

    let tier_ids: Vec<Vec<&str>> = tiering
        .tiers
        .iter()
        .map(|t| t.passed.iter().map(|b| b.id()).collect())
        .collect();
    assert_eq!(tier_ids[0], vec!["steady"]);
    assert_eq!(tier_ids[1], vec!["loved"]);
    assert_eq!(tier_ids[2], vec!["solid", "fine"]);
    assert_eq!(tier_ids[3], vec!["okay"]);

    let failed: Vec<&str> = tiering.remainder.iter().map(|b| b.id()).collect();
    assert_eq!(failed, vec!["fresh", "meh", "unknown"]);

    let archive = run_config.archive(&clock);
    for page in 1..=3 {
        assert!(archive.page_path(page).exists());
    }
    assert!(
        dir.path()
            .join("archive/2024-05-01-17-03-09-final.json")
            .exists()
    );
    assert!(dir.path().join("out.json").exists());

    let tier: Vec<Value> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("4.3 rating.json")).unwrap())
            .unwrap();
    assert_eq!(tier.len(), 3);
    assert_eq!(tier[0]["id"], "solid");
    assert_eq!(tier[0]["phone"], "+15555550100");
    assert!(tier[0]["weightedRating"].as_f64().unwrap() >= 4.3);
    assert_eq!(tier[2]["fine"]["url"], "https://www.example.com/biz/fine");
    assert_eq!(tier[2]["fine"]["rating"], 4.5);
    assert!(
        dir.path()
            .join("archive/filter/2024-05-01-17-03-09-4 rating.json")
            .exists()
    );

    let failed_file: Vec<Value> = serde_json::from_str(
        &fs::read_to_string(dir.path().join("Failed ratings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(failed_file.len(), 3);
}

#[tokio::test]
async fn test_saved_results_short_circuit_fetch() {
    let dir = tempdir().unwrap();
    let run_config = run_config(dir.path());
    let api = FakeSearch::new(listings());

    let first = FixedClock("first".to_string());
    let first_tiers = run(|| Ok((&api, config())), &run_config, &first)
        .await
        .unwrap();
    assert_eq!(api.calls(), 3);

    let second = FixedClock("second".to_string());
    let second_tiers = run(
        || -> Result<(&FakeSearch, SearchConfig)> { anyhow::bail!("no API key on a cached run") },
        &run_config,
        &second,
    )
    .await
    .unwrap();
    assert_eq!(api.calls(), 3);
    assert_eq!(first_tiers, second_tiers);
    assert!(!run_config.archive(&second).page_path(1).exists());

    let saved: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
    assert_eq!(saved["region"]["center"]["latitude"], 34.05);

    let refresh = RunConfig {
        refresh: true,
        ..run_config
    };
    let third = FixedClock("third".to_string());
    run(|| Ok((&api, config())), &refresh, &third).await.unwrap();
    assert_eq!(api.calls(), 6);
    assert!(refresh.archive(&third).final_path().exists());
}

#[tokio::test]
async fn test_duplicate_listing_aborts_before_tiering() {
    let dir = tempdir().unwrap();
    let run_config = run_config(dir.path());
    let mut data = listings();
    data[5] = listing("steady", 4.0, 10);
    let api = FakeSearch::new(data);

    let err = run(|| Ok((&api, config())), &run_config, &FixedClock("run".to_string()))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::DuplicateId("steady".to_string()))
    );
    assert!(!dir.path().join("Failed ratings.json").exists());
}
