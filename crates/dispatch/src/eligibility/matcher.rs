//! Per-order restaurant eligibility and distance ranking.
//!
//! One matching pass resolves every address it needs (order delivery
//! addresses and candidate restaurant addresses across all orders) with a
//! single [`GeocodeCache::resolve`] call.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument};

use foodcart_core::{Distance, OrderId, RestaurantId};

use super::distance::distance;
use super::menu::MenuAvailabilityIndex;
use crate::geocoder::{BatchResolution, GeocodeCache};
use crate::models::{Order, Restaurant};

/// An eligible restaurant and its distance from the delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRestaurant {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub address: String,
    /// Kilometers, rounded to three decimals. `null` when unknown.
    pub distance: Distance,
}

/// What the dispatcher sees for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    /// Already being prepared; not matched again.
    Assigned {
        restaurant_id: RestaurantId,
        /// `None` if the restaurant is not in the current snapshot.
        restaurant_name: Option<String>,
    },
    /// Restaurants able to prepare the order, nearest first.
    ///
    /// Restaurants at an unknown distance come after every known distance.
    /// Empty when no restaurant can prepare the order.
    Candidates { restaurants: Vec<RankedRestaurant> },
}

impl Assignment {
    /// Ranked candidates, or `None` for an assigned order.
    #[must_use]
    pub fn candidates(&self) -> Option<&[RankedRestaurant]> {
        match self {
            Self::Assigned { .. } => None,
            Self::Candidates { restaurants } => Some(restaurants),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEligibility {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub assignment: Assignment,
}

/// Result of a matching pass, one entry per input order in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EligibilityReport {
    entries: Vec<OrderEligibility>,
}

impl EligibilityReport {
    /// Assignment computed for `order_id`.
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&Assignment> {
        self.entries
            .iter()
            .find(|entry| entry.order_id == order_id)
            .map(|entry| &entry.assignment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderEligibility> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for EligibilityReport {
    type Item = OrderEligibility;
    type IntoIter = std::vec::IntoIter<OrderEligibility>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Candidate restaurants for one order, before distances are known.
enum Plan<'a> {
    Assigned(RestaurantId),
    Candidates(Vec<&'a Restaurant>),
}

/// Matches orders against a restaurant and menu snapshot.
#[derive(Debug, Clone, Copy)]
pub struct OrderFulfillmentMatcher<'a> {
    restaurants: &'a [Restaurant],
    availability: &'a MenuAvailabilityIndex,
}

impl<'a> OrderFulfillmentMatcher<'a> {
    #[must_use]
    pub const fn new(restaurants: &'a [Restaurant], availability: &'a MenuAvailabilityIndex) -> Self {
        Self {
            restaurants,
            availability,
        }
    }

    /// Restaurants that have every product `order` contains, in snapshot order.
    ///
    /// An order without items can be prepared anywhere.
    #[must_use]
    pub fn eligible(&self, order: &Order) -> Vec<&'a Restaurant> {
        let required = order.required_products();
        self.restaurants
            .iter()
            .filter(|restaurant| self.availability.can_fulfill(restaurant.id, &required))
            .collect()
    }

    /// Match every order, resolving all needed addresses in one batch.
    ///
    /// Geocoding problems never fail the pass: affected restaurants are
    /// listed at an unknown distance.
    #[instrument(skip_all, fields(orders = orders.len()))]
    pub async fn match_orders(&self, orders: &[Order], geocode: &GeocodeCache) -> EligibilityReport {
        let plans = self.plan(orders);
        let addresses = addresses(orders, &plans);
        let resolved = geocode.resolve(&addresses).await;

        debug!(
            addresses = addresses.len(),
            failures = resolved.errors().len(),
            "Addresses resolved"
        );

        self.rank(orders, plans, &resolved)
    }

    fn plan(&self, orders: &[Order]) -> Vec<Plan<'a>> {
        orders
            .iter()
            .map(|order| match order.assigned_restaurant {
                Some(restaurant_id) => Plan::Assigned(restaurant_id),
                None => Plan::Candidates(self.eligible(order)),
            })
            .collect()
    }

    fn rank(
        &self,
        orders: &[Order],
        plans: Vec<Plan<'a>>,
        resolved: &BatchResolution,
    ) -> EligibilityReport {
        let entries = orders
            .iter()
            .zip(plans)
            .map(|(order, plan)| {
                let assignment = match plan {
                    Plan::Assigned(restaurant_id) => Assignment::Assigned {
                        restaurant_id,
                        restaurant_name: self
                            .restaurants
                            .iter()
                            .find(|r| r.id == restaurant_id)
                            .map(|r| r.name.clone()),
                    },
                    Plan::Candidates(candidates) => Assignment::Candidates {
                        restaurants: rank_candidates(order, &candidates, resolved),
                    },
                };
                OrderEligibility {
                    order_id: order.id,
                    assignment,
                }
            })
            .collect();

        EligibilityReport { entries }
    }
}

/// Every address a pass needs: delivery addresses of orders with at least
/// one candidate plus the addresses of those candidates.
fn addresses(orders: &[Order], plans: &[Plan<'_>]) -> HashSet<String> {
    let mut addresses = HashSet::new();
    for (order, plan) in orders.iter().zip(plans) {
        if let Plan::Candidates(candidates) = plan
            && !candidates.is_empty()
        {
            addresses.insert(order.address.clone());
            addresses.extend(candidates.iter().map(|r| r.address.clone()));
        }
    }
    addresses
}

fn rank_candidates(
    order: &Order,
    candidates: &[&Restaurant],
    resolved: &BatchResolution,
) -> Vec<RankedRestaurant> {
    let origin = resolved.coordinates(&order.address);

    let mut ranked: Vec<RankedRestaurant> = candidates
        .iter()
        .map(|restaurant| RankedRestaurant {
            restaurant_id: restaurant.id,
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
            distance: distance(origin, resolved.coordinates(&restaurant.address)).rounded(),
        })
        .collect();

    // Sorted on the rounded value so equal displayed distances fall back to name.
    ranked.sort_by(|a, b| {
        a.distance
            .cmp(&b.distance)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.restaurant_id.cmp(&b.restaurant_id))
    });
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use foodcart_core::{OrderStatus, PaymentMethod, Price, ProductId};

    use super::*;
    use crate::geocoder::testing::StubGeocoder;
    use crate::geocoder::{CacheOptions, InMemoryLocationStore};
    use crate::models::{MenuItem, OrderLine};

    fn restaurant(id: i32, name: &str, address: &str) -> Restaurant {
        Restaurant {
            id: RestaurantId::new(id),
            name: name.to_string(),
            address: address.to_string(),
            contact_phone: String::new(),
        }
    }

    fn order(id: i32, address: &str, products: &[i32]) -> Order {
        Order {
            id: OrderId::new(id),
            firstname: "Anna".to_string(),
            lastname: "Ivanova".to_string(),
            phonenumber: "+79001112233".to_string(),
            address: address.to_string(),
            status: OrderStatus::New,
            payment_method: PaymentMethod::Online,
            assigned_restaurant: None,
            note: String::new(),
            created_on: Utc::now(),
            items: products
                .iter()
                .map(|p| OrderLine {
                    product_id: ProductId::new(*p),
                    quantity: 1,
                    price: Price::ZERO,
                })
                .collect(),
        }
    }

    fn stock(restaurant: i32, products: &[i32]) -> Vec<MenuItem> {
        products
            .iter()
            .map(|p| MenuItem {
                restaurant_id: RestaurantId::new(restaurant),
                product_id: ProductId::new(*p),
                availability: true,
            })
            .collect()
    }

    fn cache(geocoder: &Arc<StubGeocoder>) -> GeocodeCache {
        GeocodeCache::new(
            Arc::new(InMemoryLocationStore::new()),
            Arc::clone(geocoder) as Arc<dyn crate::geocoder::Geocoder>,
            CacheOptions::default(),
        )
    }

    fn names(assignment: &Assignment) -> Vec<&str> {
        assignment
            .candidates()
            .unwrap()
            .iter()
            .map(|r| r.name.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_ranks_nearest_first() {
        let restaurants = vec![
            restaurant(2, "B", "Addr-B"),
            restaurant(1, "A", "Addr-A"),
        ];
        let menu: Vec<MenuItem> = [stock(1, &[1]), stock(2, &[1])].concat();
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::with(&[
            ("Addr-O", 55.76, 37.60),
            ("Addr-A", 55.75, 37.62),
            ("Addr-B", 55.80, 37.50),
        ]));

        let orders = vec![order(1, "Addr-O", &[1])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        let assignment = report.get(OrderId::new(1)).unwrap();
        assert_eq!(names(assignment), vec!["A", "B"]);
        let ranked = assignment.candidates().unwrap();
        let km: Vec<f64> = ranked.iter().filter_map(|r| r.distance.km()).collect();
        assert_eq!(km.len(), 2);
        assert!(km.iter().zip([1.674, 7.674]).all(|(got, want)| (got - want).abs() < 0.01));
    }

    #[tokio::test]
    async fn test_unresolved_restaurant_is_listed_last() {
        let restaurants = vec![
            restaurant(3, "C", "Nowhere"),
            restaurant(1, "A", "Addr-A"),
        ];
        let menu: Vec<MenuItem> = [stock(1, &[1]), stock(3, &[1])].concat();
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::with(&[
            ("Addr-O", 55.76, 37.60),
            ("Addr-A", 55.75, 37.62),
        ]));

        let orders = vec![order(1, "Addr-O", &[1])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        let assignment = report.get(OrderId::new(1)).unwrap();
        assert_eq!(names(assignment), vec!["A", "C"]);
        let last = assignment.candidates().unwrap().last().unwrap();
        assert_eq!(last.distance, Distance::Unknown);
    }

    #[tokio::test]
    async fn test_unresolved_delivery_address_keeps_every_candidate() {
        let restaurants = vec![
            restaurant(2, "Beta", "Addr-B"),
            restaurant(1, "Alpha", "Addr-A"),
        ];
        let menu: Vec<MenuItem> = [stock(1, &[1]), stock(2, &[1])].concat();
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::with(&[
            ("Addr-A", 55.75, 37.62),
            ("Addr-B", 55.80, 37.50),
        ]));

        let orders = vec![order(1, "Unknown street", &[1])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        let assignment = report.get(OrderId::new(1)).unwrap();
        assert_eq!(names(assignment), vec!["Alpha", "Beta"]);
        assert!(
            assignment
                .candidates()
                .unwrap()
                .iter()
                .all(|r| !r.distance.is_known())
        );
    }

    #[tokio::test]
    async fn test_missing_product_excludes_restaurant() {
        let restaurants = vec![
            restaurant(1, "A", "Addr-A"),
            restaurant(2, "B", "Addr-B"),
        ];
        let menu: Vec<MenuItem> = [stock(1, &[1, 2, 3]), stock(2, &[1, 2])].concat();
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::default());

        let orders = vec![order(1, "Addr-O", &[1, 2, 3]), order(2, "Addr-O", &[1, 2])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        assert_eq!(names(report.get(OrderId::new(1)).unwrap()), vec!["A"]);
        assert_eq!(names(report.get(OrderId::new(2)).unwrap()), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_order_nobody_can_prepare_is_still_listed() {
        let restaurants = vec![restaurant(1, "A", "Addr-A")];
        let menu = stock(1, &[1]);
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::default());

        let orders = vec![order(7, "Addr-O", &[42])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get(OrderId::new(7)),
            Some(&Assignment::Candidates {
                restaurants: vec![]
            })
        );
    }

    #[tokio::test]
    async fn test_empty_order_is_eligible_everywhere() {
        let restaurants = vec![
            restaurant(1, "A", "Addr-A"),
            restaurant(2, "Empty kitchen", "Addr-E"),
        ];
        let menu = stock(1, &[1]);
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::default());

        let orders = vec![order(1, "Addr-O", &[])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        assert_eq!(
            names(report.get(OrderId::new(1)).unwrap()),
            vec!["A", "Empty kitchen"]
        );
    }

    #[tokio::test]
    async fn test_assigned_order_passes_through() {
        let restaurants = vec![restaurant(1, "A", "Addr-A")];
        let menu = stock(1, &[1]);
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::default());

        let mut assigned = order(1, "Addr-O", &[1]);
        assigned.assigned_restaurant = Some(RestaurantId::new(1));
        let mut orphaned = order(2, "Addr-O", &[1]);
        orphaned.assigned_restaurant = Some(RestaurantId::new(99));

        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&[assigned, orphaned], &cache(&geocoder))
            .await;

        assert_eq!(
            report.get(OrderId::new(1)),
            Some(&Assignment::Assigned {
                restaurant_id: RestaurantId::new(1),
                restaurant_name: Some("A".to_string()),
            })
        );
        assert_eq!(
            report.get(OrderId::new(2)),
            Some(&Assignment::Assigned {
                restaurant_id: RestaurantId::new(99),
                restaurant_name: None,
            })
        );
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_shared_addresses_are_looked_up_once_per_pass() {
        let restaurants = vec![
            restaurant(1, "A", "Addr-A"),
            restaurant(2, "B", "Addr-B"),
        ];
        let menu: Vec<MenuItem> = [stock(1, &[1]), stock(2, &[1])].concat();
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::with(&[
            ("Addr-O", 55.76, 37.60),
            ("Addr-A", 55.75, 37.62),
            ("Addr-B", 55.80, 37.50),
        ]));
        let cache = cache(&geocoder);

        let orders: Vec<Order> = (1..=5).map(|id| order(id, "Addr-O", &[1])).collect();
        let matcher = OrderFulfillmentMatcher::new(&restaurants, &index);

        let report = matcher.match_orders(&orders, &cache).await;
        assert_eq!(report.len(), 5);
        assert_eq!(geocoder.calls(), 3);

        matcher.match_orders(&orders, &cache).await;
        assert_eq!(geocoder.calls(), 3);
    }

    #[tokio::test]
    async fn test_equal_distances_break_ties_by_name() {
        let restaurants = vec![
            restaurant(2, "Zeta", "Same place"),
            restaurant(1, "Alpha", "Same place"),
        ];
        let menu: Vec<MenuItem> = [stock(1, &[1]), stock(2, &[1])].concat();
        let index = MenuAvailabilityIndex::build(&menu);
        let geocoder = Arc::new(StubGeocoder::with(&[
            ("Addr-O", 55.76, 37.60),
            ("Same place", 55.75, 37.62),
        ]));

        let orders = vec![order(1, "Addr-O", &[1])];
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &cache(&geocoder))
            .await;

        assert_eq!(names(report.get(OrderId::new(1)).unwrap()), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_report_serializes_with_kind_tag() {
        let report = EligibilityReport {
            entries: vec![OrderEligibility {
                order_id: OrderId::new(5),
                assignment: Assignment::Candidates {
                    restaurants: vec![RankedRestaurant {
                        restaurant_id: RestaurantId::new(1),
                        name: "A".to_string(),
                        address: "Addr-A".to_string(),
                        distance: Distance::Unknown,
                    }],
                },
            }],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[0]["order_id"], 5);
        assert_eq!(json[0]["kind"], "candidates");
        assert!(json[0]["restaurants"][0]["distance"].is_null());
    }
}
