use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::database::models::{District, Location, Market, Region};
use crate::database::repository::Repository;
use crate::database::StoreError;

/// Location augmented with its resolved containment chain for display.
/// Unresolvable references leave the nested field absent, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct LocationView {
    #[serde(flatten)]
    pub location: Location,
    pub district: Option<DistrictView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictView {
    pub name: String,
    pub manager_employee_id: Option<i32>,
    pub market: Option<MarketView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketView {
    pub name: String,
    pub region: Option<RegionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionView {
    pub name: String,
}

/// Batch lookups for the levels above Location. The store cannot join this
/// chain in one query, so composition happens here; the trait seam keeps the
/// one-fetch-per-level property observable in tests.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    async fn districts_by_ids(&self, ids: &[i32]) -> Result<Vec<District>, StoreError>;
    async fn markets_by_ids(&self, ids: &[i32]) -> Result<Vec<Market>, StoreError>;
    async fn regions_by_ids(&self, ids: &[i32]) -> Result<Vec<Region>, StoreError>;
}

pub struct PgHierarchyStore {
    pool: PgPool,
}

impl PgHierarchyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HierarchyStore for PgHierarchyStore {
    async fn districts_by_ids(&self, ids: &[i32]) -> Result<Vec<District>, StoreError> {
        Repository::new("districts", self.pool.clone()).select_by_ids(ids).await
    }

    async fn markets_by_ids(&self, ids: &[i32]) -> Result<Vec<Market>, StoreError> {
        Repository::new("markets", self.pool.clone()).select_by_ids(ids).await
    }

    async fn regions_by_ids(&self, ids: &[i32]) -> Result<Vec<Region>, StoreError> {
        Repository::new("regions", self.pool.clone()).select_by_ids(ids).await
    }
}

fn distinct_ids<I: IntoIterator<Item = Option<i32>>>(refs: I) -> Vec<i32> {
    refs.into_iter().flatten().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Attach district/market/region to each location.
///
/// One batch fetch per level regardless of location count; issuing a query
/// per location against the remote store is the N+1 hazard this exists to
/// avoid.
pub async fn assemble_locations(
    store: &dyn HierarchyStore,
    locations: Vec<Location>,
) -> Result<Vec<LocationView>, StoreError> {
    let district_ids = distinct_ids(locations.iter().map(|l| l.district_id));
    let districts = store.districts_by_ids(&district_ids).await?;

    let market_ids = distinct_ids(districts.iter().map(|d| d.market_id));
    let markets = store.markets_by_ids(&market_ids).await?;

    let region_ids = distinct_ids(markets.iter().map(|m| m.region_id));
    let regions = store.regions_by_ids(&region_ids).await?;

    Ok(attach(locations, &districts, &markets, &regions))
}

/// Pure reference walk over pre-fetched id maps.
fn attach(
    locations: Vec<Location>,
    districts: &[District],
    markets: &[Market],
    regions: &[Region],
) -> Vec<LocationView> {
    let district_map: HashMap<i32, &District> = districts.iter().map(|d| (d.id, d)).collect();
    let market_map: HashMap<i32, &Market> = markets.iter().map(|m| (m.id, m)).collect();
    let region_map: HashMap<i32, &Region> = regions.iter().map(|r| (r.id, r)).collect();

    locations
        .into_iter()
        .map(|location| {
            let district = location
                .district_id
                .and_then(|id| district_map.get(&id))
                .map(|district| {
                    let market = district
                        .market_id
                        .and_then(|id| market_map.get(&id))
                        .map(|market| {
                            let region = market
                                .region_id
                                .and_then(|id| region_map.get(&id))
                                .map(|region| RegionView {
                                    name: region.name.clone(),
                                });
                            MarketView {
                                name: market.name.clone(),
                                region,
                            }
                        });
                    DistrictView {
                        name: district.name.clone(),
                        manager_employee_id: district.manager_employee_id,
                        market,
                    }
                });

            LocationView { location, district }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn location(id: i32, district_id: Option<i32>) -> Location {
        Location {
            id,
            name: format!("Site {}", id),
            address: None,
            district_id,
            manager_employee_id: None,
            is_active: true,
        }
    }

    fn district(id: i32, market_id: Option<i32>) -> District {
        District {
            id,
            name: format!("District {}", id),
            market_id,
            manager_employee_id: None,
        }
    }

    fn market(id: i32, region_id: Option<i32>) -> Market {
        Market {
            id,
            name: format!("Market {}", id),
            region_id,
        }
    }

    fn region(id: i32) -> Region {
        Region {
            id,
            name: format!("Region {}", id),
        }
    }

    /// In-memory store that counts how many fetches hit each level.
    struct CountingStore {
        districts: Vec<District>,
        markets: Vec<Market>,
        regions: Vec<Region>,
        district_calls: AtomicUsize,
        market_calls: AtomicUsize,
        region_calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(districts: Vec<District>, markets: Vec<Market>, regions: Vec<Region>) -> Self {
            Self {
                districts,
                markets,
                regions,
                district_calls: AtomicUsize::new(0),
                market_calls: AtomicUsize::new(0),
                region_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HierarchyStore for CountingStore {
        async fn districts_by_ids(&self, ids: &[i32]) -> Result<Vec<District>, StoreError> {
            self.district_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.districts.iter().filter(|d| ids.contains(&d.id)).cloned().collect())
        }

        async fn markets_by_ids(&self, ids: &[i32]) -> Result<Vec<Market>, StoreError> {
            self.market_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.markets.iter().filter(|m| ids.contains(&m.id)).cloned().collect())
        }

        async fn regions_by_ids(&self, ids: &[i32]) -> Result<Vec<Region>, StoreError> {
            self.region_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.regions.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_one_fetch_per_level_regardless_of_location_count() {
        let store = CountingStore::new(
            vec![district(1, Some(10)), district(2, Some(10))],
            vec![market(10, Some(100))],
            vec![region(100)],
        );
        let locations = vec![
            location(1, Some(1)),
            location(2, Some(2)),
            location(3, Some(1)),
        ];

        let views = assemble_locations(&store, locations).await.unwrap();

        assert_eq!(store.district_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.market_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.region_calls.load(Ordering::SeqCst), 1);

        assert_eq!(views.len(), 3);
        for view in &views {
            let region_name = view
                .district
                .as_ref()
                .and_then(|d| d.market.as_ref())
                .and_then(|m| m.region.as_ref())
                .map(|r| r.name.as_str());
            assert_eq!(region_name, Some("Region 100"));
        }
    }

    #[tokio::test]
    async fn test_unresolvable_references_leave_fields_absent() {
        // District 7 does not exist; district 1 points at a missing market.
        let store = CountingStore::new(vec![district(1, Some(99))], vec![], vec![]);
        let locations = vec![
            location(1, Some(7)),
            location(2, Some(1)),
            location(3, None),
        ];

        let views = assemble_locations(&store, locations).await.unwrap();

        assert!(views[0].district.is_none());
        let resolved = views[1].district.as_ref().unwrap();
        assert_eq!(resolved.name, "District 1");
        assert!(resolved.market.is_none());
        assert!(views[2].district.is_none());
    }

    #[test]
    fn test_attach_walks_full_chain() {
        let views = attach(
            vec![location(1, Some(1))],
            &[district(1, Some(10))],
            &[market(10, Some(100))],
            &[region(100)],
        );
        let district = views[0].district.as_ref().unwrap();
        let market = district.market.as_ref().unwrap();
        let region = market.region.as_ref().unwrap();
        assert_eq!(region.name, "Region 100");
    }
}
