//! Demo data supplier
//!
//! Generates product-performance records from a seeded RNG so a given
//! `--seed` always produces the same snapshot sequence. Each call to
//! `next_store` advances the RNG, giving the next refresh cycle.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabview_core::models::{FieldDescriptor, Record, Schema};
use tabview_core::RecordStore;

/// Per-product ranges, loosely matching what each product reports in production
struct ProductProfile {
    name: &'static str,
    accuracy_floor: f64,
    response_ms: (f64, f64),
    warning_rate: f64,
    cost_per_call: f64,
}

static PRODUCTS: [ProductProfile; 6] = [
    ProductProfile {
        name: "wrapportal",
        accuracy_floor: 85.0,
        response_ms: (80.0, 120.0),
        warning_rate: 0.05,
        cost_per_call: 0.012,
    },
    ProductProfile {
        name: "kinetic",
        accuracy_floor: 80.0,
        response_ms: (120.0, 170.0),
        warning_rate: 0.08,
        cost_per_call: 0.018,
    },
    ProductProfile {
        name: "asureify",
        accuracy_floor: 75.0,
        response_ms: (150.0, 210.0),
        warning_rate: 0.12,
        cost_per_call: 0.021,
    },
    ProductProfile {
        name: "riskguru",
        accuracy_floor: 82.0,
        response_ms: (100.0, 160.0),
        warning_rate: 0.06,
        cost_per_call: 0.025,
    },
    ProductProfile {
        name: "anzenn",
        accuracy_floor: 88.0,
        response_ms: (60.0, 100.0),
        warning_rate: 0.03,
        cost_per_call: 0.009,
    },
    ProductProfile {
        name: "prequaligy",
        accuracy_floor: 78.0,
        response_ms: (140.0, 200.0),
        warning_rate: 0.10,
        cost_per_call: 0.015,
    },
];

pub struct DemoSupplier {
    rng: StdRng,
    count: usize,
    next_id: u64,
}

impl DemoSupplier {
    pub fn new(seed: u64, count: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            count,
            next_id: 1,
        }
    }

    pub fn schema() -> Schema {
        Schema::new(vec![
            FieldDescriptor::text("id"),
            FieldDescriptor::timestamp("timestamp"),
            FieldDescriptor::categorical("product"),
            FieldDescriptor::numeric("accuracy"),
            FieldDescriptor::numeric("responseTime"),
            FieldDescriptor::numeric("volume"),
            FieldDescriptor::numeric("successRate"),
            FieldDescriptor::numeric("errorRate"),
            FieldDescriptor::numeric("cost"),
            FieldDescriptor::categorical("status"),
        ])
    }

    /// Records spread over the hour before `now`, one per minute bucket
    pub fn next_store(&mut self, now: DateTime<Utc>) -> RecordStore {
        let records = (0..self.count).map(|i| self.record(now, i)).collect();
        RecordStore::new(Self::schema(), records)
    }

    fn record(&mut self, now: DateTime<Utc>, index: usize) -> Record {
        let profile = &PRODUCTS[self.rng.gen_range(0..PRODUCTS.len())];
        let minutes_ago = ((self.count - index) * 60 / self.count.max(1)) as i64;

        let accuracy = profile.accuracy_floor + self.rng.gen::<f64>() * (100.0 - profile.accuracy_floor);
        let response_time = self.rng.gen_range(profile.response_ms.0..profile.response_ms.1);
        let volume = self.rng.gen_range(150..250) as f64;
        let error_rate = self.rng.gen::<f64>() * 2.0 + 0.5;
        let status = if self.rng.gen_bool(profile.warning_rate) {
            "warning"
        } else {
            "success"
        };

        let id = format!("req_{:06}", self.next_id);
        self.next_id += 1;

        Record::new()
            .with("id", id)
            .with("timestamp", now - Duration::minutes(minutes_ago))
            .with("product", profile.name)
            .with("accuracy", round_to(accuracy, 1))
            .with("responseTime", response_time.round())
            .with("volume", volume)
            .with("successRate", round_to(100.0 - error_rate, 2))
            .with("errorRate", round_to(error_rate, 2))
            .with("cost", round_to(volume * profile.cost_per_call, 2))
            .with("status", status)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
