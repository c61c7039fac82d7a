use serde::{Deserialize, Serialize};

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    io::Read,
    path::Path,
};

use crate::{
    amount::Amount,
    error::Result,
    files::{fold_rows, open, parse_amount, write_output},
};

/// Number of products listed in `top_productos`.
pub const TOP_PRODUCTS: usize = 10;

const DEFAULT_CATEGORY: &str = "General";
const DATE_PREFIX_LEN: usize = 10;
const REQUIRED_COLUMNS: [&str; 4] = ["Fecha", "Producto", "Importe", "Cantidad"];

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Defines the CSV format for a sales export.
///
/// `Categoria` is optional; sales exported without it are counted under
/// `General`.
#[derive(Debug, Deserialize)]
pub struct SaleRow {
    #[serde(rename = "Fecha")]
    pub date: String,
    #[serde(rename = "Producto")]
    pub product: String,
    #[serde(rename = "Categoria", default = "default_category")]
    pub category: String,
    #[serde(rename = "Importe")]
    pub amount: String,
    #[serde(rename = "Cantidad")]
    pub quantity: String,
}

/// A parsed sale, ready to be folded into a [`Dashboard`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sale {
    pub date: String,
    pub product: String,
    pub category: String,
    pub amount: Amount,
    pub quantity: Amount,
}

impl Sale {
    /// Parses the export row at `line`.
    ///
    /// `Importe` and `Cantidad` accept thousands separators, like catalog
    /// prices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if `Importe` or
    /// `Cantidad` is not a number.
    pub fn from_row(line: u64, row: SaleRow) -> Result<Self> {
        Ok(Self {
            amount: parse_amount(line, "Importe", &row.amount)?,
            quantity: parse_amount(line, "Cantidad", &row.quantity)?,
            date: row.date,
            product: row.product,
            category: row.category,
        })
    }

    /// Returns the day this sale counts towards: the first ten characters
    /// of its timestamp, normally `YYYY-MM-DD`. The prefix is not validated.
    #[must_use]
    pub fn day(&self) -> String {
        self.date.chars().take(DATE_PREFIX_LEN).collect()
    }
}

/// A map that remembers the order in which keys were first inserted.
#[derive(Debug)]
struct Tally<V> {
    slots: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Tally<V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Default> Tally<V> {
    /// Returns the value for `key`, inserting a default one first if needed.
    fn entry(&mut self, key: &str) -> &mut V {
        let slot = match self.slots.get(key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.slots.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot].1
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[derive(Debug, Default)]
struct ProductTotals {
    sales: Amount,
    category: String,
}

/// Total sales for one day.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DailySales {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "monto")]
    pub amount: Amount,
}

/// Total sales for one product, with the category it was last sold under.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProductSales {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ventas")]
    pub sales: Amount,
    #[serde(rename = "categoria")]
    pub category: String,
}

/// Total sales for one category.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategorySales {
    pub name: String,
    pub value: Amount,
}

/// The JSON document consumed by the sales dashboard.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DashboardData {
    #[serde(rename = "ventas_diarias")]
    pub daily_sales: Vec<DailySales>,
    #[serde(rename = "top_productos")]
    pub top_products: Vec<ProductSales>,
    #[serde(rename = "categorias")]
    pub categories: Vec<CategorySales>,
}

/// Holds aggregated sales data.
///
/// To create a new, empty `Dashboard`, use [`Dashboard::new`].
///
/// To add sales data, use [`Dashboard::read_csv`], [`Dashboard::read_from`],
/// or [`Dashboard::add_sale`].
///
/// To get the dashboard document, use [`Dashboard::data`]. The [`Display`]
/// implementation gives a printable summary of the best-selling products.
#[derive(Debug, Default)]
pub struct Dashboard {
    daily: BTreeMap<String, Amount>,
    products: Tally<ProductTotals>,
    categories: Tally<Amount>,
    revenue: Amount,
    units: Amount,
}

impl Dashboard {
    /// Creates a new, empty dashboard.
    #[must_use]
    pub fn new() -> Dashboard {
        Self::default()
    }

    /// Reads sales from the export at `path` and updates the totals.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be opened
    /// * The header lacks `Fecha`, `Producto`, `Importe` or `Cantidad`
    /// * A row is malformed CSV
    /// * An `Importe` or `Cantidad` is not a number
    pub fn read_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.read_from(open(path)?)
    }

    /// Like [`Dashboard::read_csv`], but reads CSV data from `reader`.
    ///
    /// # Errors
    ///
    /// As for [`Dashboard::read_csv`], apart from opening the file.
    pub fn read_from(&mut self, reader: impl Read) -> Result<()> {
        fold_rows(reader, &REQUIRED_COLUMNS, |line, row| {
            self.add_sale(&Sale::from_row(line, row)?);
            Ok(())
        })
    }

    /// Folds one sale into the daily, product and category totals.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eleventa::{Amount, Dashboard, Sale};
    /// let mut dashboard = Dashboard::new();
    /// for amount in [100.0, 50.0] {
    ///     dashboard.add_sale(&Sale {
    ///         date: "2024-11-05 10:31:00".into(),
    ///         product: "Tomate".into(),
    ///         category: "Verduras".into(),
    ///         amount: Amount::new(amount),
    ///         quantity: Amount::new(1.0),
    ///     });
    /// }
    /// let daily = dashboard.daily_sales();
    /// assert_eq!(daily.len(), 1);
    /// assert_eq!(daily[0].date, "2024-11-05");
    /// assert_eq!(daily[0].amount, Amount::new(150.0));
    /// ```
    pub fn add_sale(&mut self, sale: &Sale) {
        *self.daily.entry(sale.day()).or_default() += sale.amount;
        let product = self.products.entry(&sale.product);
        product.sales += sale.amount;
        product.category.clone_from(&sale.category);
        *self.categories.entry(&sale.category) += sale.amount;
        self.revenue += sale.amount;
        self.units += sale.quantity;
    }

    /// Returns total sales per day, oldest first.
    #[must_use]
    pub fn daily_sales(&self) -> Vec<DailySales> {
        self.daily
            .iter()
            .map(|(date, amount)| DailySales {
                date: date.clone(),
                amount: *amount,
            })
            .collect()
    }

    /// Returns the `limit` best-selling products by amount, descending.
    ///
    /// Products with identical sales keep the order in which they were first
    /// sold.
    #[must_use]
    pub fn top_products(&self, limit: usize) -> Vec<ProductSales> {
        let mut products: Vec<_> = self
            .products
            .iter()
            .map(|(name, totals)| ProductSales {
                name: name.to_string(),
                sales: totals.sales,
                category: totals.category.clone(),
            })
            .collect();
        products.sort_by(|a, b| b.sales.total_cmp(&a.sales));
        products.truncate(limit);
        products
    }

    /// Returns total sales per category, in the order categories first
    /// appeared.
    #[must_use]
    pub fn categories(&self) -> Vec<CategorySales> {
        self.categories
            .iter()
            .map(|(name, value)| CategorySales {
                name: name.to_string(),
                value: *value,
            })
            .collect()
    }

    /// Returns the sum of every sale amount.
    #[must_use]
    pub fn total_sales(&self) -> Amount {
        self.revenue
    }

    /// Returns the sum of every sale quantity.
    #[must_use]
    pub fn total_units(&self) -> Amount {
        self.units
    }

    /// Returns the dashboard document, with the top [`TOP_PRODUCTS`] products.
    #[must_use]
    pub fn data(&self) -> DashboardData {
        DashboardData {
            daily_sales: self.daily_sales(),
            top_products: self.top_products(TOP_PRODUCTS),
            categories: self.categories(),
        }
    }

    /// Returns the dashboard document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns any error from [`serde_json::to_string_pretty`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.data())?)
    }

    /// Writes the dashboard document to `path`, creating missing directories
    /// and overwriting the file.
    ///
    /// # Errors
    ///
    /// Returns any error from serializing or writing the file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        write_output(path, &self.to_json()?)
    }
}

impl Display for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let top = self.top_products(TOP_PRODUCTS);
        let width = top
            .iter()
            .map(|p| p.name.chars().count())
            .max()
            .unwrap_or_default()
            .max("Producto".len());
        writeln!(f, "{:width$} {:>12}", "Producto", "Ventas")?;
        let length = width + 13;
        writeln!(f, "{:-<length$}", "")?;
        for product in &top {
            writeln!(f, "{:width$} {:>12}", product.name, product.sales)?;
        }
        writeln!(f, "{:-<length$}", "")?;
        writeln!(f, "{:width$} {:>12}", "Total", self.revenue)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn dashboard_from(csv: &str) -> Dashboard {
        let mut dashboard = Dashboard::new();
        dashboard.read_from(csv.as_bytes()).unwrap();
        dashboard
    }

    #[test]
    fn read_from_fn_sums_sales_on_the_same_day() {
        let dashboard = dashboard_from(
            "Fecha,Producto,Categoria,Importe,Cantidad\n\
             2024-11-05 09:12:00,Tomate,Verduras,100.0,2\n\
             2024-11-05 18:40:00,Cebolla,Verduras,50.0,1\n",
        );
        assert_eq!(
            dashboard.daily_sales(),
            vec![DailySales {
                date: "2024-11-05".into(),
                amount: Amount::new(150.0),
            }]
        );
    }

    #[test]
    fn read_from_fn_counts_sales_without_category_as_general() {
        let dashboard = dashboard_from(
            "Fecha,Producto,Importe,Cantidad\n\
             2024-11-05,Tomate,30,1\n\
             2024-11-06,Pan,12.5,1\n",
        );
        assert_eq!(
            dashboard.categories(),
            vec![CategorySales {
                name: "General".into(),
                value: Amount::new(42.5),
            }]
        );
        assert_eq!(dashboard.top_products(10)[0].category, "General");
    }

    #[test]
    fn read_from_fn_keeps_short_dates_whole() {
        let dashboard = dashboard_from("Fecha,Producto,Importe,Cantidad\n5/11,Pan,10,1\n");
        assert_eq!(dashboard.daily_sales()[0].date, "5/11");
    }

    #[test]
    fn read_from_fn_rejects_non_numeric_quantity() {
        let mut dashboard = Dashboard::new();
        let err = dashboard
            .read_from("Fecha,Producto,Importe,Cantidad\n2024-11-05,Pan,10,uno\n".as_bytes())
            .unwrap_err();
        assert!(
            matches!(&err, Error::Parse { line: 2, field, .. } if field == "Cantidad"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn read_from_fn_rejects_non_finite_amount() {
        let mut dashboard = Dashboard::new();
        let err = dashboard
            .read_from("Fecha,Producto,Importe,Cantidad\n2024-11-05,Pan,NaN,1\n".as_bytes())
            .unwrap_err();
        assert!(
            matches!(&err, Error::Parse { line: 2, field, .. } if field == "Importe"),
            "unexpected error: {err}"
        );
        assert!(dashboard.top_products(TOP_PRODUCTS).is_empty());
    }

    #[test]
    fn read_from_fn_accepts_comma_grouped_amounts() {
        let dashboard = dashboard_from(
            "Fecha,Producto,Importe,Cantidad\n\
             2024-11-05,Despensa,\"1,250.00\",\"1,000\"\n",
        );
        assert_eq!(dashboard.total_sales(), Amount::new(1250.0));
        assert_eq!(dashboard.total_units(), Amount::new(1000.0));
    }

    #[test]
    fn read_from_fn_rejects_export_without_amount() {
        let mut dashboard = Dashboard::new();
        let err = dashboard
            .read_from("Fecha,Producto,Cantidad\n2024-11-05,Pan,1\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column } if column == "Importe"));
    }

    #[test]
    fn read_csv_fn_sorts_daily_sales_by_date() {
        let mut dashboard = Dashboard::new();
        dashboard.read_csv("testdata/ventas_eleventa.csv").unwrap();
        let dates: Vec<_> = dashboard.daily_sales().into_iter().map(|d| d.date).collect();
        assert_eq!(dates, ["2024-11-03", "2024-11-04", "2024-11-05"]);
        assert_eq!(dashboard.daily_sales()[1].amount, Amount::new(290.0));
    }

    #[test]
    fn read_csv_fn_fails_for_missing_file() {
        let mut dashboard = Dashboard::new();
        let err = dashboard.read_csv("testdata/bogus.csv").unwrap_err();
        assert!(matches!(err, Error::MissingFile { .. }));
    }

    #[test]
    fn top_products_fn_sorts_by_sales_descending_and_limits_to_ten() {
        let mut dashboard = Dashboard::new();
        dashboard.read_csv("testdata/ventas_eleventa.csv").unwrap();
        let top = dashboard.top_products(TOP_PRODUCTS);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].sales >= w[1].sales));
        assert_eq!(top[0].name, "Aguacate Hass");
        assert_eq!(top[0].sales, Amount::new(320.0));
        assert!(!top.iter().any(|p| p.name == "Chile Serrano"));
    }

    #[test]
    fn top_products_fn_breaks_ties_by_first_sale() {
        let dashboard = dashboard_from(
            "Fecha,Producto,Importe,Cantidad\n\
             2024-11-05,Pan,10,1\n\
             2024-11-05,Leche,20,1\n\
             2024-11-05,Huevo,10,1\n",
        );
        let names: Vec<_> = dashboard.top_products(3).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Leche", "Pan", "Huevo"]);
    }

    #[test]
    fn add_sale_fn_records_last_seen_category() {
        let dashboard = dashboard_from(
            "Fecha,Producto,Categoria,Importe,Cantidad\n\
             2024-11-05,Limón,Frutas,10,1\n\
             2024-11-06,Limón,Verduras,15,1\n",
        );
        assert_eq!(
            dashboard.top_products(10),
            vec![ProductSales {
                name: "Limón".into(),
                sales: Amount::new(25.0),
                category: "Verduras".into(),
            }]
        );
        let names: Vec<_> = dashboard.categories().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Frutas", "Verduras"]);
    }

    #[test]
    fn totals_accumulate_amounts_and_quantities() {
        let mut dashboard = Dashboard::new();
        dashboard.read_csv("testdata/ventas_eleventa.csv").unwrap();
        assert_eq!(dashboard.total_sales(), Amount::new(1280.0));
        assert_eq!(dashboard.total_units(), Amount::new(41.5));
    }

    #[test]
    fn write_fn_writes_dashboard_json() {
        let mut dashboard = Dashboard::new();
        dashboard.read_csv("testdata/ventas_eleventa.csv").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public").join("dashboard_data.json");
        dashboard.write(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        for key in ["ventas_diarias", "top_productos", "categorias"] {
            assert!(keys.iter().any(|k| k == key), "missing key {key}");
        }
        assert!(json.contains("\"nombre\": \"Plátano\""), "non-ASCII must be literal");
        let data: DashboardData = serde_json::from_str(&json).unwrap();
        assert_eq!(data, dashboard.data());
    }

    #[test]
    fn display_lists_top_products_and_total() {
        let dashboard = dashboard_from(
            "Fecha,Producto,Importe,Cantidad\n\
             2024-11-05,Pan,10,1\n\
             2024-11-05,Leche,20,1\n",
        );
        let want = "Producto       Ventas\n\
                    ---------------------\n\
                    Leche           20.00\n\
                    Pan             10.00\n\
                    ---------------------\n\
                    Total           30.00\n";
        assert_eq!(dashboard.to_string(), want);
    }
}
