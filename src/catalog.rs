use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;

use std::{
    collections::HashMap,
    convert::Infallible,
    fmt::Display,
    io::Read,
    path::Path,
    str::FromStr,
};

use crate::{
    amount::Amount,
    error::Result,
    files::{fold_rows, open, parse_amount, write_output},
    slug::slugify,
};

/// Title line of the price list.
pub const PRICE_LIST_TITLE: &str = "Lista de precios del día:";

const DEFAULT_CATEGORY: &str = "General";
const DEFAULT_UNIT: &str = "pz";
const REQUIRED_COLUMNS: [&str; 2] = ["Descripcion", "Precio"];

/// Whether a product can be ordered.
///
/// Exports mark availability with a free-text token. Only `1`, `true`,
/// `TRUE`, `sí` and `si` (after trimming) count as available; anything else,
/// including an empty field, means unavailable. When the column is missing
/// altogether every product is assumed available.
#[derive(Clone, Copy, Debug, DeserializeFromStr, Eq, PartialEq)]
pub struct Availability(bool);

impl Availability {
    const TRUTHY: [&'static str; 5] = ["1", "true", "sí", "si", "TRUE"];

    fn assumed() -> Self {
        Self(true)
    }

    #[must_use]
    pub fn is_available(self) -> bool {
        self.0
    }
}

impl FromStr for Availability {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Self::TRUTHY.contains(&s.trim())))
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Defines the CSV format for a product catalog export.
///
/// `Descripcion` and `Precio` are required. The other columns may be left
/// out of the export entirely.
#[derive(Debug, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "Codigo", default)]
    pub code: String,
    #[serde(rename = "Descripcion")]
    pub description: String,
    #[serde(rename = "Categoria", default = "default_category")]
    pub category: String,
    #[serde(rename = "Precio")]
    pub price: String,
    #[serde(rename = "Unidad", default)]
    pub unit: String,
    #[serde(rename = "Oferta", default)]
    pub offer: String,
    #[serde(rename = "Disponible", default = "Availability::assumed")]
    pub available: Availability,
}

/// One product as published in `catalog.json`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "precio")]
    pub price: Amount,
    #[serde(rename = "unidad")]
    pub unit: String,
    #[serde(rename = "oferta")]
    pub offer: Option<String>,
    #[serde(rename = "disponible")]
    pub available: bool,
}

impl CatalogItem {
    /// Builds the catalog entry for the export row at `line`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if `Precio` is not a
    /// number.
    pub fn from_row(line: u64, row: CatalogRow) -> Result<Self> {
        let name = row.description.trim().to_string();
        let id = if row.code.is_empty() {
            slugify(&name)
        } else {
            slugify(&row.code)
        };
        let unit = if row.unit.is_empty() {
            DEFAULT_UNIT
        } else {
            row.unit.trim()
        };
        let offer = Some(row.offer.trim())
            .filter(|offer| !offer.is_empty())
            .map(str::to_string);
        Ok(Self {
            id,
            price: parse_amount(line, "Precio", &row.price)?,
            category: row.category.trim().to_string(),
            unit: unit.to_string(),
            offer,
            available: row.available.is_available(),
            name,
        })
    }
}

/// Holds a product catalog read from one or more exports.
///
/// To create a new, empty `Catalog`, use [`Catalog::new`].
///
/// To add products, use [`Catalog::read_csv`] or [`Catalog::read_from`].
///
/// The [`Display`] implementation renders the price list of available
/// products; [`Catalog::to_json`] renders the full catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Creates a new, empty catalog.
    #[must_use]
    pub fn new() -> Catalog {
        Self::default()
    }

    /// Reads products from the export at `path`, appending them in file order.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be opened
    /// * The header lacks `Descripcion` or `Precio`
    /// * A row is malformed CSV
    /// * A `Precio` is not a number
    pub fn read_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.read_from(open(path)?)
    }

    /// Like [`Catalog::read_csv`], but reads CSV data from `reader`.
    ///
    /// # Errors
    ///
    /// As for [`Catalog::read_csv`], apart from opening the file.
    pub fn read_from(&mut self, reader: impl Read) -> Result<()> {
        fold_rows(reader, &REQUIRED_COLUMNS, |line, row| {
            self.items.push(CatalogItem::from_row(line, row)?);
            Ok(())
        })
    }

    /// Returns every product, available or not, in input order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Returns the available products grouped by category.
    ///
    /// Categories come in the order they first appear among available
    /// products; within a category, products are sorted by name.
    #[must_use]
    pub fn available_by_category(&self) -> Vec<(&str, Vec<&CatalogItem>)> {
        let mut groups: Vec<(&str, Vec<&CatalogItem>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for item in self.items.iter().filter(|item| item.available) {
            let slot = *index.entry(item.category.as_str()).or_insert_with(|| {
                groups.push((item.category.as_str(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(item);
        }
        for (_, items) in &mut groups {
            items.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    /// Returns the whole catalog as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns any error from [`serde_json::to_string_pretty`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.items)?)
    }

    /// Writes the JSON catalog to `json_path` and the price list to
    /// `text_path`, creating missing directories and overwriting both files.
    ///
    /// # Errors
    ///
    /// Returns any error from serializing or writing either file.
    pub fn write(&self, json_path: impl AsRef<Path>, text_path: impl AsRef<Path>) -> Result<()> {
        write_output(json_path, &self.to_json()?)?;
        write_output(text_path, &self.to_string())
    }
}

impl Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{PRICE_LIST_TITLE}")?;
        for (category, items) in self.available_by_category() {
            write!(f, "\n\n[{category}]")?;
            for item in items {
                write!(f, "\n- {} ({}): ${}", item.name, item.unit, item.price)?;
                if let Some(offer) = &item.offer {
                    write!(f, " • {offer}")?;
                }
            }
        }
        Ok(())
    }
}
