//! `qctrl orders` — list recent orders from a running daemon.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use super::ApiClient;

#[derive(Args, Debug)]
pub struct OrdersArgs {
    /// Emit machine-readable JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub client: ApiClient,
}

#[derive(Tabled)]
struct OrderTableRow {
    #[tabled(rename = "order")]
    order: String,
    #[tabled(rename = "customer")]
    customer: String,
    #[tabled(rename = "product")]
    product: String,
    #[tabled(rename = "qty")]
    quantity: String,
    #[tabled(rename = "order date")]
    order_date: String,
    #[tabled(rename = "mail")]
    mail: String,
}

impl OrdersArgs {
    pub fn run(self) -> Result<()> {
        let orders = self.client.get("/api/orders")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&orders).context("failed to render orders JSON")?
            );
            return Ok(());
        }

        let rows = match orders.as_array() {
            Some(rows) => rows,
            None => anyhow::bail!("unexpected /api/orders payload: expected an array"),
        };
        if rows.is_empty() {
            println!("No orders in the store yet.");
            return Ok(());
        }

        let table_rows: Vec<OrderTableRow> = rows.iter().map(table_row).collect();
        let mut table = Table::new(table_rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{} order(s)", rows.len());
        Ok(())
    }
}

fn table_row(order: &Value) -> OrderTableRow {
    let key = format!(
        "{}-{}",
        order.get("sipno").and_then(Value::as_i64).unwrap_or(0),
        order.get("sipsr").and_then(Value::as_i64).unwrap_or(0),
    );
    OrderTableRow {
        order: key,
        customer: text_field(order, "firma"),
        product: text_field(order, "urunadi"),
        quantity: order
            .get("mik")
            .and_then(Value::as_f64)
            .map(|qty| qty.to_string())
            .unwrap_or_else(|| "-".to_string()),
        order_date: text_field(order, "tarih"),
        mail: if order.get("mail_sent").and_then(Value::as_bool) == Some(true) {
            "sent".green().to_string()
        } else {
            "pending".yellow().to_string()
        },
    }
}

fn text_field(order: &Value, field: &str) -> String {
    order
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_row_renders_missing_fields_as_dashes() {
        let row = table_row(&json!({
            "sipno": 7, "sipsr": 2, "mail_sent": false
        }));
        assert_eq!(row.order, "7-2");
        assert_eq!(row.customer, "-");
        assert_eq!(row.quantity, "-");
    }

    #[test]
    fn table_row_picks_up_populated_fields() {
        let row = table_row(&json!({
            "sipno": 100, "sipsr": 1, "firma": "Acme",
            "urunadi": "Sofa", "mik": 2.5, "tarih": "2026-08-20",
            "mail_sent": true
        }));
        assert_eq!(row.order, "100-1");
        assert_eq!(row.customer, "Acme");
        assert_eq!(row.product, "Sofa");
        assert_eq!(row.quantity, "2.5");
        assert_eq!(row.order_date, "2026-08-20");
    }
}
