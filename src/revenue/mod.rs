//! Synthetic revenue data for the churn project.
//!
//! Reads the `customers` table, fabricates one revenue row per month of
//! each customer's tenure, and appends the rows to the `revenue` table.

pub mod generator;

pub use generator::RevenueGenerator;

use chrono::NaiveDate;
use rand::Rng;
use tracing::info;

use crate::db::{QueryResult, Row, Value};
use crate::error::{ChurnError, Result};
use crate::query::QueryExecutor;

/// Query used to read the source customers.
pub const CUSTOMERS_QUERY: &str = "SELECT * FROM customers";

/// Table the generated rows are appended to.
pub const REVENUE_TABLE: &str = "revenue";

/// Columns written to [`REVENUE_TABLE`], in row order.
pub const REVENUE_COLUMNS: [&str; 3] = ["customerID", "month", "amount"];

const CUSTOMER_ID_COLUMN: &str = "customerID";
const TENURE_COLUMN: &str = "tenure";
const MONTHLY_CHARGES_COLUMN: &str = "MonthlyCharges";

/// The fields of a customer record the generator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub customer_id: String,
    pub tenure: Option<i64>,
    pub monthly_charges: Option<f64>,
}

impl Customer {
    /// Number of months to generate: the tenure when positive, otherwise one.
    pub fn months(&self) -> u32 {
        match self.tenure {
            Some(t) if t > 0 => u32::try_from(t).unwrap_or(u32::MAX),
            _ => 1,
        }
    }

    /// The monthly charge, or zero when it is missing.
    pub fn monthly_amount(&self) -> f64 {
        self.monthly_charges
            .filter(|m| !m.is_nan())
            .unwrap_or(0.0)
    }

    /// Decodes customers from a result table by column name.
    ///
    /// `tenure` and `MonthlyCharges` values that are NULL or not numeric are
    /// treated as missing. A row without a `customerID` is an error.
    pub fn from_table(table: &QueryResult) -> Result<Vec<Customer>> {
        let column = |name: &str| {
            table.column_index(name).ok_or_else(|| {
                ChurnError::generate(format!("customers table has no {name} column"))
            })
        };

        let id_idx = column(CUSTOMER_ID_COLUMN)?;
        let tenure_idx = column(TENURE_COLUMN)?;
        let monthly_idx = column(MONTHLY_CHARGES_COLUMN)?;

        table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let customer_id = match row.get(id_idx) {
                    Some(Value::Null) | None => {
                        return Err(ChurnError::generate(format!(
                            "customer row {i} has no {CUSTOMER_ID_COLUMN}"
                        )))
                    }
                    Some(value) => value.to_display_string(),
                };

                Ok(Customer {
                    customer_id,
                    tenure: row.get(tenure_idx).and_then(Value::as_i64),
                    monthly_charges: row.get(monthly_idx).and_then(Value::as_f64),
                })
            })
            .collect()
    }
}

/// One fabricated month of revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRow {
    pub customer_id: String,
    pub month: NaiveDate,
    pub amount: f64,
}

impl RevenueRow {
    /// Converts to a row ordered like [`REVENUE_COLUMNS`].
    pub fn to_row(&self) -> Row {
        vec![
            Value::String(self.customer_id.clone()),
            Value::Date(self.month),
            Value::Float(self.amount),
        ]
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    pub customers: usize,
    pub rows_generated: usize,
    pub rows_written: u64,
}

/// Reads every customer, generates their revenue and appends it.
///
/// With `dry_run` set nothing is written and `rows_written` is zero.
pub async fn generate_revenue<R: Rng>(
    executor: &QueryExecutor<'_>,
    generator: &mut RevenueGenerator<R>,
    dry_run: bool,
) -> Result<GenerationSummary> {
    let table = executor.query_to_table(CUSTOMERS_QUERY).await?;
    let customers = Customer::from_table(&table)?;
    info!("Loaded {} customers", customers.len());

    let rows: Vec<Row> = generator
        .generate(&customers)
        .iter()
        .map(RevenueRow::to_row)
        .collect();

    let rows_written = if dry_run {
        info!("Dry run: not writing {} revenue rows", rows.len());
        0
    } else {
        executor
            .append_rows(REVENUE_TABLE, &REVENUE_COLUMNS, &rows)
            .await?
    };

    Ok(GenerationSummary {
        customers: customers.len(),
        rows_generated: rows.len(),
        rows_written,
    })
}
