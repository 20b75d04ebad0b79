//! Synthetic CDP data seeding
//!
//! Distributions mirror the production dataset: CLV is Beta(5,2) capped at
//! 1.0, sensitivity scores are uniform, 70% of abandoned carts fall inside
//! the last 7 days, transactions span the last year and accounts the last
//! two years.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution};
use tracing::info;

use aether_config::WarehouseConfig;
use aether_core::CartItem;

use crate::store::{CartRecord, CustomerRecord, InMemoryWarehouse, ScoreRecord, TransactionRecord};
use crate::WarehouseError;

/// Transactions seeded per customer
const TRANSACTIONS_PER_CUSTOMER: usize = 5;

/// Fraction of customers with an abandoned cart
const CART_FRACTION: f64 = 0.5;

const FIRST_NAMES: &[&str] = &[
    "Emma", "Liam", "Olivia", "Noah", "Ava", "Ethan", "Sophia", "Mason", "Isabella", "William",
    "Mia", "James", "Charlotte", "Benjamin", "Amelia", "Lucas", "Harper", "Henry", "Evelyn",
    "Alexander", "Abigail", "Michael", "Emily", "Daniel", "Elizabeth", "Matthew", "Sofia",
    "Jackson", "Avery", "Sebastian", "Ella", "Jack", "Scarlett", "Aiden", "Grace", "Owen", "Chloe",
];

const CITIES: &[(&str, &str)] = &[
    ("New York", "United States"),
    ("Los Angeles", "United States"),
    ("Chicago", "United States"),
    ("Houston", "United States"),
    ("Phoenix", "United States"),
    ("Seattle", "United States"),
    ("London", "United Kingdom"),
    ("Manchester", "United Kingdom"),
    ("Birmingham", "United Kingdom"),
    ("Glasgow", "United Kingdom"),
    ("Edinburgh", "United Kingdom"),
    ("Toronto", "Canada"),
    ("Vancouver", "Canada"),
    ("Montreal", "Canada"),
    ("Calgary", "Canada"),
    ("Ottawa", "Canada"),
    ("Sydney", "Australia"),
    ("Melbourne", "Australia"),
    ("Brisbane", "Australia"),
    ("Perth", "Australia"),
    ("Adelaide", "Australia"),
];

const ACQUISITION_SOURCES: &[&str] = &[
    "organic_search",
    "paid_search",
    "social_media",
    "email_campaign",
    "referral",
    "direct",
    "display_ads",
    "affiliate",
];

/// Furniture catalog: category, products, price range
const CATALOG: &[(&str, &[&str], (f64, f64))] = &[
    (
        "Living Room",
        &["Sofa", "Armchair", "Coffee Table", "TV Stand", "Bookshelf", "Side Table", "Rug", "Ottoman"],
        (200.0, 2500.0),
    ),
    (
        "Bedroom",
        &["Bed Frame", "Mattress", "Wardrobe", "Nightstand", "Dresser", "Bedding Set", "Mirror", "Bedside Lamp"],
        (150.0, 1800.0),
    ),
    (
        "Kitchen & Dining",
        &["Dining Table", "Dining Chairs", "Bar Stool", "Kitchen Cabinet", "Cookware Set", "Dinnerware Set", "Kitchen Cart", "Cutlery Set"],
        (100.0, 1500.0),
    ),
    (
        "Office",
        &["Desk", "Office Chair", "Filing Cabinet", "Desk Lamp", "Bookcase", "Monitor Stand", "Storage Box", "Whiteboard"],
        (150.0, 1200.0),
    ),
    (
        "Storage & Organization",
        &["Shelving Unit", "Storage Boxes", "Drawer Unit", "Closet Organizer", "Shoe Rack", "Wall Shelf", "Storage Basket", "Cabinet"],
        (30.0, 400.0),
    ),
    (
        "Bathroom",
        &["Bathroom Cabinet", "Mirror Cabinet", "Towel Rack", "Bath Mat", "Shower Curtain", "Storage Trolley", "Vanity Unit", "Bathroom Shelf"],
        (50.0, 600.0),
    ),
    (
        "Outdoor",
        &["Patio Set", "Garden Chair", "Outdoor Table", "Sun Lounger", "Parasol", "Outdoor Storage", "Planter", "Garden Bench"],
        (100.0, 1200.0),
    ),
    (
        "Lighting",
        &["Floor Lamp", "Table Lamp", "Ceiling Light", "Pendant Light", "Desk Lamp", "LED Strip", "Wall Light", "Smart Bulb"],
        (20.0, 300.0),
    ),
    (
        "Textiles",
        &["Curtains", "Cushions", "Throw Blanket", "Duvet Cover", "Pillow", "Bath Towel", "Table Runner", "Rug"],
        (10.0, 150.0),
    ),
    (
        "Decoration",
        &["Wall Art", "Vase", "Picture Frame", "Candle Holder", "Plant Pot", "Clock", "Decorative Bowl", "Wall Sticker"],
        (15.0, 200.0),
    ),
];

impl InMemoryWarehouse {
    /// Seed a warehouse from configuration
    pub fn seeded(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::seeded_with_rng(&config.dataset, config.seed_customers, &mut rng)
    }

    /// Seed a warehouse with an explicit RNG
    pub fn seeded_with_rng(
        dataset: &str,
        customer_count: usize,
        rng: &mut StdRng,
    ) -> Result<Self, WarehouseError> {
        let clv_distribution: Beta<f64> =
            Beta::new(5.0, 2.0).map_err(|e| WarehouseError::Seed(e.to_string()))?;

        let now = Utc::now();
        let mut customers = Vec::with_capacity(customer_count);
        let mut scores = Vec::with_capacity(customer_count);

        for i in 0..customer_count {
            let customer_id = format!("cust_{:06}", i + 1);
            let first_name = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let (city, country) = CITIES[rng.gen_range(0..CITIES.len())];
            let clv_score = clv_distribution.sample(rng).min(1.0);

            customers.push(CustomerRecord {
                email_address: format!(
                    "{}.{customer_id}@example.com",
                    FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())].to_lowercase()
                ),
                first_name: first_name.to_string(),
                location_city: city.to_string(),
                location_country: country.to_string(),
                acquisition_source: ACQUISITION_SOURCES[rng.gen_range(0..ACQUISITION_SOURCES.len())]
                    .to_string(),
                creation_date: now - Duration::days(rng.gen_range(1..=730)),
                clv_score: round3(clv_score),
                customer_id: customer_id.clone(),
            });

            scores.push(ScoreRecord {
                customer_id,
                discount_sensitivity_score: round3(rng.gen_range(0.0..1.0)),
                free_shipping_sensitivity_score: round3(rng.gen_range(0.0..1.0)),
                exclusivity_seeker_flag: rng.gen_bool(0.5),
                churn_probability_score: round3(rng.gen_range(0.0..1.0)),
                social_proof_affinity: round3(rng.gen_range(0.0..1.0)),
                content_engagement_score: round3(rng.gen_range(0.0..1.0)),
            });
        }

        let transaction_count = customer_count * TRANSACTIONS_PER_CUSTOMER;
        let mut transactions = Vec::with_capacity(transaction_count);
        for i in 0..transaction_count {
            let customer = &customers[rng.gen_range(0..customer_count)];
            let (category, products, price_range) = CATALOG[rng.gen_range(0..CATALOG.len())];

            transactions.push(TransactionRecord {
                transaction_id: format!("txn_{:08}", i + 1),
                customer_id: customer.customer_id.clone(),
                order_value: round2(rng.gen_range(price_range.0..price_range.1)),
                product_category: category.to_string(),
                product_name: products[rng.gen_range(0..products.len())].to_string(),
                timestamp: now
                    - Duration::days(rng.gen_range(1..=365))
                    - Duration::hours(rng.gen_range(0..=23)),
            });
        }

        // A random half of customers left a cart behind
        let cart_count = (customer_count as f64 * CART_FRACTION) as usize;
        let cart_customers = rand::seq::index::sample(rng, customer_count, cart_count);
        let mut carts = Vec::with_capacity(cart_count);

        for (i, customer_index) in cart_customers.into_iter().enumerate() {
            let customer_id = customers[customer_index].customer_id.clone();

            // 70% of carts are recent enough for cart-recovery campaigns
            let hours_ago = if rng.gen_bool(0.7) {
                rng.gen_range(1..=168)
            } else {
                rng.gen_range(169..=720)
            };

            let mut items = Vec::new();
            let mut total_value = 0.0;
            for _ in 0..rng.gen_range(1..=5) {
                let (category, products, price_range) = CATALOG[rng.gen_range(0..CATALOG.len())];
                let price = round2(rng.gen_range(price_range.0..price_range.1));
                total_value += price;
                items.push(CartItem {
                    product: products[rng.gen_range(0..products.len())].to_string(),
                    category: category.to_string(),
                    price,
                });
            }

            carts.push(CartRecord {
                cart_id: format!("cart_{:06}", i + 1),
                customer_id,
                cart_value: round2(total_value),
                items: serde_json::to_string(&items)
                    .map_err(|e| WarehouseError::Seed(e.to_string()))?,
                timestamp: now - Duration::hours(hours_ago),
                status: "abandoned".to_string(),
            });
        }

        info!(
            dataset,
            customers = customer_count,
            transactions = transaction_count,
            carts = cart_count,
            "seeded in-memory warehouse"
        );

        Ok(Self::new(dataset, customers, scores, carts, transactions))
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
