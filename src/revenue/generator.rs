//! Synthetic monthly revenue for a customer.

use chrono::{Months, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{Customer, RevenueRow};
use crate::error::{ChurnError, Result};

/// Standard deviation of the relative month-to-month noise.
pub const NOISE_STD_DEV: f64 = 0.03;

/// Noise is clamped to this magnitude (five standard deviations).
pub const MAX_NOISE: f64 = 0.15;

/// First and last year of the candidate start months.
const FIRST_START_YEAR: i32 = 2018;
const LAST_START_YEAR: i32 = 2022;

/// Returns every first-of-month date from 2018-01-01 through 2022-12-01.
pub fn start_months() -> Vec<NaiveDate> {
    (FIRST_START_YEAR..=LAST_START_YEAR)
        .flat_map(|year| (1..=12).filter_map(move |month| NaiveDate::from_ymd_opt(year, month, 1)))
        .collect()
}

/// Rounds to two decimal places.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Fabricates revenue rows from customer records.
pub struct RevenueGenerator<R> {
    rng: R,
    start_months: Vec<NaiveDate>,
    noise: Normal<f64>,
}

impl<R: Rng> RevenueGenerator<R> {
    /// Creates a generator drawing from `rng`.
    pub fn new(rng: R) -> Result<Self> {
        let noise = Normal::new(0.0, NOISE_STD_DEV)
            .map_err(|e| ChurnError::internal(format!("invalid noise distribution: {e}")))?;

        Ok(Self {
            rng,
            start_months: start_months(),
            noise,
        })
    }

    /// Produces one row per month of the customer's tenure.
    ///
    /// Months are consecutive first-of-month dates starting at a random
    /// start month. Each amount is the monthly charge with a little normal
    /// noise, never negative, rounded to cents.
    pub fn rows_for(&mut self, customer: &Customer) -> Vec<RevenueRow> {
        let start = self.start_months[self.rng.gen_range(0..self.start_months.len())];
        let monthly = customer.monthly_amount();

        (0..customer.months())
            .map_while(|offset| start.checked_add_months(Months::new(offset)))
            .map(|month| RevenueRow {
                customer_id: customer.customer_id.clone(),
                month,
                amount: self.amount(monthly),
            })
            .collect()
    }

    /// Produces rows for every customer, in input order.
    pub fn generate(&mut self, customers: &[Customer]) -> Vec<RevenueRow> {
        customers
            .iter()
            .flat_map(|customer| self.rows_for(customer))
            .collect()
    }

    fn amount(&mut self, monthly: f64) -> f64 {
        let noise = self
            .noise
            .sample(&mut self.rng)
            .clamp(-MAX_NOISE, MAX_NOISE);
        round_cents((monthly * (1.0 + noise)).max(0.0))
    }
}
