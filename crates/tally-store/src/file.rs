//! # JSON File Store
//!
//! Durable [`PersistenceStore`] backed by two files in a data directory.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  <data dir>/                                                           │
//! │  ├── catalog.json   whole catalog, rewritten on every save             │
//! │  │                  (written to catalog.json.tmp, then renamed)        │
//! │  └── sales.jsonl    one committed sale per line, append-only           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rename makes a catalog save all-or-nothing on the same filesystem.
//! A torn final line in `sales.jsonl` (crash mid-append) is skipped with a
//! warning; a malformed line anywhere else is an error.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tally_core::{CoreResult, DateRange, PersistenceStore, Product, Sale};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

const CATALOG_FILE: &str = "catalog.json";
const SALES_FILE: &str = "sales.jsonl";

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    // One writer at a time per file set.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        info!(dir = %dir.display(), "Opened file store");
        Ok(JsonFileStore {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }

    pub fn sales_path(&self) -> PathBuf {
        self.dir.join(SALES_FILE)
    }

    /// `true` once a catalog has been saved here.
    pub fn has_catalog(&self) -> bool {
        self.catalog_path().is_file()
    }

    pub fn read_catalog(&self) -> StoreResult<Vec<Product>> {
        let path = self.catalog_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Serialization {
            path,
            line: None,
            source,
        })
    }

    pub fn write_catalog(&self, products: &[Product]) -> StoreResult<()> {
        let path = self.catalog_path();
        let tmp = path.with_extension("json.tmp");
        let bytes =
            serde_json::to_vec_pretty(products).map_err(|source| StoreError::Serialization {
                path: path.clone(),
                line: None,
                source,
            })?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        debug!(products = products.len(), path = %path.display(), "Catalog saved");
        Ok(())
    }

    pub fn write_sale(&self, sale: &Sale) -> StoreResult<()> {
        let path = self.sales_path();
        let mut line = serde_json::to_string(sale).map_err(|source| StoreError::Serialization {
            path: path.clone(),
            line: None,
            source,
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&path, e))?;
        debug!(sale_id = %sale.id, "Sale appended");
        Ok(())
    }

    pub fn read_sales(&self, range: DateRange) -> StoreResult<Vec<Sale>> {
        let path = self.sales_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::io(&path, e))?;
        let last = lines.len();

        let mut sales = Vec::new();
        for (idx, text) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Sale>(text) {
                Ok(sale) if range.contains(sale.timestamp) => sales.push(sale),
                Ok(_) => {}
                Err(source) if line_no == last => {
                    warn!(line = line_no, error = %source, "Skipping torn final sale record");
                }
                Err(source) => {
                    return Err(StoreError::Serialization {
                        path,
                        line: Some(line_no),
                        source,
                    })
                }
            }
        }
        Ok(sales)
    }
}

impl PersistenceStore for JsonFileStore {
    fn load_catalog(&self) -> CoreResult<Vec<Product>> {
        Ok(self.read_catalog()?)
    }

    fn save_catalog(&self, products: &[Product]) -> CoreResult<()> {
        Ok(self.write_catalog(products)?)
    }

    fn append_sale(&self, sale: &Sale) -> CoreResult<()> {
        Ok(self.write_sale(sale)?)
    }

    fn load_sales(&self, range: DateRange) -> CoreResult<Vec<Sale>> {
        Ok(self.read_sales(range)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tally_core::{Channel, DiscountRate, Money, PendingSale, SaleId, SaleLine};
    use tempfile::TempDir;

    fn sale(id: u32, day: u32) -> Sale {
        PendingSale {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            channel: Channel::Online,
            lines: vec![SaleLine {
                product_id: tally_core::ProductId::new(1),
                name: "Coffee".to_string(),
                unit_price_cents: 350,
                quantity: 2,
            }],
            subtotal: Money::from_cents(700),
            discount: DiscountRate::from_bps(1000),
            total: Money::from_cents(630),
        }
        .into_sale(SaleId::new(id))
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("nested")).unwrap();
        assert!(!store.has_catalog());
        assert!(store.read_catalog().unwrap().is_empty());
        assert!(store.read_sales(DateRange::all()).unwrap().is_empty());
    }

    #[test]
    fn test_catalog_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let products = vec![
            Product::new(1, "Coffee", 350, 98).with_barcode("123456"),
            Product::new(2, "Sandwich", 599, 50),
        ];
        JsonFileStore::open(dir.path())
            .unwrap()
            .save_catalog(&products)
            .unwrap();

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert!(reopened.has_catalog());
        assert_eq!(reopened.load_catalog().unwrap(), products);
        assert!(!dir.path().join("catalog.json.tmp").exists());
    }

    #[test]
    fn test_sales_append_and_filter() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.append_sale(&sale(1, 1)).unwrap();
        store.append_sale(&sale(2, 2)).unwrap();
        store.append_sale(&sale(3, 3)).unwrap();

        let all = store.load_sales(DateRange::all()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], sale(1, 1));

        let from = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let second_day = store
            .load_sales(DateRange::between(from, from + Duration::days(1)))
            .unwrap();
        assert_eq!(second_day, vec![sale(2, 2)]);
    }

    #[test]
    fn test_torn_last_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.append_sale(&sale(1, 1)).unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(store.sales_path())
            .unwrap();
        file.write_all(b"{\"id\":2,\"times").unwrap();

        assert_eq!(store.load_sales(DateRange::all()).unwrap(), vec![sale(1, 1)]);
    }

    #[test]
    fn test_corrupt_middle_line_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.append_sale(&sale(1, 1)).unwrap();
        {
            let mut file = OpenOptions::new()
                .append(true)
                .open(store.sales_path())
                .unwrap();
            file.write_all(b"not json\n").unwrap();
        }
        store.append_sale(&sale(3, 3)).unwrap();

        let err = store.read_sales(DateRange::all()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization { line: Some(2), .. }));
    }
}
