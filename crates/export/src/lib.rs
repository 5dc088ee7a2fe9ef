//! CSV export of storefront data.
//!
//! Turns catalog, order, and purchase rows into a UTF-8 CSV document
//! with a header row. Orders are flattened to one row per line item
//! with the order fields repeated, so the file is usable in a
//! spreadsheet without joins.

mod error;

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use store::{Catalog, Orders, OrderWithItems, Purchases};

pub use crate::error::{ExportError, Result};

/// Which table an export draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Product,
    Order,
    Purchase,
}

impl FromStr for DataType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "product" => Ok(DataType::Product),
            "order" => Ok(DataType::Order),
            "purchase" => Ok(DataType::Purchase),
            other => Err(ExportError::UnknownDataType(other.to_string())),
        }
    }
}

/// Parses an inclusive `YYYY-MM-DD` lower bound into a UTC instant at
/// midnight. `None` and blank input mean no filter.
fn parse_start_date(start_date: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = start_date.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ExportError::InvalidDate(raw.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ExportError::InvalidDate(raw.to_string()))?;
    Ok(Some(midnight.and_utc()))
}

/// Service producing CSV documents from the store.
#[derive(Clone)]
pub struct ExportService<S> {
    store: S,
}

impl<S> ExportService<S>
where
    S: Catalog + Orders + Purchases,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds a CSV document for `data_type`, keeping only rows created
    /// at or after `start_date` when one is given.
    ///
    /// Both arguments are validated before the store is touched, so a
    /// bad request never costs a query.
    #[tracing::instrument(skip(self))]
    pub async fn export_csv(&self, data_type: &str, start_date: Option<&str>) -> Result<Vec<u8>> {
        let data_type: DataType = data_type.parse()?;
        let since = parse_start_date(start_date)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        match data_type {
            DataType::Product => self.write_products(&mut writer, since).await?,
            DataType::Order => self.write_orders(&mut writer, since).await?,
            DataType::Purchase => self.write_purchases(&mut writer, since).await?,
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(writer
            .into_inner()
            .map_err(|e| ExportError::Csv(e.into_error().into()))?)
    }

    async fn write_products(
        &self,
        writer: &mut csv::Writer<Vec<u8>>,
        since: Option<DateTime<Utc>>,
    ) -> Result<()> {
        writer.write_record(["name", "price", "stock", "category", "created_at"])?;
        for product in self.store.products_since(since).await? {
            writer.write_record([
                product.name.as_str(),
                &product.price.to_string(),
                &product.stock.to_string(),
                product.category.as_str(),
                &product.created_at.to_rfc3339(),
            ])?;
        }
        Ok(())
    }

    async fn write_orders(
        &self,
        writer: &mut csv::Writer<Vec<u8>>,
        since: Option<DateTime<Utc>>,
    ) -> Result<()> {
        writer.write_record([
            "order_id",
            "customer",
            "phone",
            "address",
            "created_at",
            "product_name",
            "price",
            "category",
            "quantity",
            "status",
        ])?;
        for entry in self.store.orders_since(since).await? {
            write_order_rows(writer, &entry)?;
        }
        Ok(())
    }

    async fn write_purchases(
        &self,
        writer: &mut csv::Writer<Vec<u8>>,
        since: Option<DateTime<Utc>>,
    ) -> Result<()> {
        writer.write_record([
            "purchase_id",
            "owner",
            "phone",
            "address",
            "created_at",
            "product_name",
            "price",
            "category",
            "quantity",
            "status",
        ])?;
        for purchase in self.store.purchases_since(since).await? {
            writer.write_record([
                &purchase.id.to_string(),
                purchase.owner.as_str(),
                purchase.phone.as_str(),
                purchase.address.as_str(),
                &purchase.created_at.to_rfc3339(),
                purchase.product_name.as_str(),
                &purchase.product_price.to_string(),
                purchase.product_category.as_str(),
                &purchase.product_quantity.to_string(),
                purchase.status.as_str(),
            ])?;
        }
        Ok(())
    }
}

/// Writes one CSV row per line item, repeating the order fields on each.
fn write_order_rows(writer: &mut csv::Writer<Vec<u8>>, entry: &OrderWithItems) -> Result<()> {
    for item in &entry.items {
        writer.write_record([
            &entry.order.id.to_string(),
            entry.order.customer.as_str(),
            entry.order.phone.as_str(),
            entry.order.address.as_str(),
            &entry.order.created_at.to_rfc3339(),
            item.product_name.as_str(),
            &item.product_price.to_string(),
            item.product_category.as_str(),
            &item.quantity.to_string(),
            entry.order.status.as_str(),
        ])?;
    }
    Ok(())
}
