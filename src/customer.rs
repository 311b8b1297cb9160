//! Customer lookup table.
//!
//! Customers are read from a CSV file with a `name,auth_file` header:
//!
//! ```text
//! name,auth_file
//! Acme,C:\auth\acme.xml
//! "Globex, Inc",C:\auth\globex.xml
//! ```
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("failed to load customer table {}: {source}", .path.display())]
    Load { path: PathBuf, source: csv::Error },
    #[error("customer \"{0}\" does not exist")]
    NotFound(String),
    #[error("customer table is empty")]
    Empty,
}

/// A TECommander configuration that can be queried.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Customer {
    pub name: String,
    pub auth_file: PathBuf,
}

impl Customer {
    pub fn new(name: impl Into<String>, auth_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            auth_file: auth_file.into(),
        }
    }
}

/// Read-only mapping from customer name to its configuration.
#[derive(Debug, Default, Clone)]
pub struct CustomerTable {
    customers: HashMap<String, Customer>,
}

impl CustomerTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CustomerError> {
        let path = path.as_ref();
        let load = |source| CustomerError::Load {
            path: path.to_path_buf(),
            source,
        };
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(load)?;
        let table = Self::from_csv(rdr).map_err(load)?;
        debug!("loaded {} customer(s) from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        Self::from_csv(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader),
        )
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, csv::Error> {
        let mut customers = HashMap::new();
        for row in rdr.deserialize() {
            let c: Customer = row?;
            if let Some(prev) = customers.insert(c.name.clone(), c) {
                warn!("duplicate customer \"{}\"; keeping the later row", prev.name);
            }
        }
        Ok(Self { customers })
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Result<&Customer, CustomerError> {
        self.customers
            .get(name)
            .ok_or_else(|| CustomerError::NotFound(name.to_string()))
    }

    /// Customer names ordered case-insensitively, as shown in the menu.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.customers.keys().map(String::as_str).collect();
        names.sort_by_cached_key(|n| (n.to_lowercase(), n.to_string()));
        names
    }

    /// All customers in menu order.
    pub fn all(&self) -> Vec<&Customer> {
        self.names()
            .into_iter()
            .filter_map(|n| self.customers.get(n))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl FromIterator<Customer> for CustomerTable {
    fn from_iter<I: IntoIterator<Item = Customer>>(iter: I) -> Self {
        Self {
            customers: iter.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }
}
