// tests against the real powo api
// run with: cargo test --features live-powo
// needs network access

#![cfg(feature = "live-powo")]

use powo::{Powo, PowoConfig, SpeciesQuery};

#[tokio::test]
async fn test_live_quercus_alba() {
    let powo = Powo::new(PowoConfig::default()).unwrap();
    let query = SpeciesQuery::new("Quercus", "alba").unwrap();

    let lookup = powo.lookup(&query).await.unwrap();

    assert!(lookup.total_found >= 1);
    assert!(lookup.records.iter().any(|r| r.accepted_name == "Quercus alba"));
}

#[tokio::test]
async fn test_live_allium_cepa_distribution() {
    let powo = Powo::new(PowoConfig::default()).unwrap();
    let query = SpeciesQuery::parse("Allium cepa").unwrap();

    let ids = powo.search(&query).await.unwrap();
    assert!(!ids.is_empty());

    let record = powo.taxon(&ids[0]).await.unwrap();
    assert_eq!(record.family.as_deref(), Some("Amaryllidaceae"));
}
