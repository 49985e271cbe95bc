//! File-based customer book at ~/.pinbook/customers.json.
//!
//! The whole book is rewritten on every change. A missing file is seeded with
//! one demo customer on first load.

use super::customer::{ContactForm, Customer};
use super::search;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot access customer book {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt customer book {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("Customer with this number already exists")]
    DuplicateMobile,

    #[error("No customer with id {0}")]
    NotFound(i64),
}

pub struct CustomerBook {
    path: PathBuf,
    customers: Vec<Customer>,
}

impl CustomerBook {
    /// Load the book, seeding a demo record if the file does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            let customers = vec![demo_customer()];
            write_book(&path, &customers)?;
            return Ok(Self { path, customers });
        }
        let data = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let customers = serde_json::from_str(&data).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, customers })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn search(&self, term: &str) -> Vec<&Customer> {
        search::filter(&self.customers, term)
    }

    /// Validate and append a new customer.
    pub fn add(&mut self, form: ContactForm) -> Result<Customer, StoreError> {
        form.validate().map_err(StoreError::Invalid)?;
        if self.mobile_taken(form.mobile.trim(), None) {
            return Err(StoreError::DuplicateMobile);
        }
        let customer = form.into_customer(self.next_id(), Utc::now());
        let mut next = self.customers.clone();
        next.push(customer.clone());
        self.commit(next)?;
        tracing::info!(id = customer.id, "customer added");
        Ok(customer)
    }

    /// Replace an existing customer's details, keeping its id and creation time.
    pub fn update(&mut self, id: i64, form: ContactForm) -> Result<Customer, StoreError> {
        form.validate().map_err(StoreError::Invalid)?;
        if self.mobile_taken(form.mobile.trim(), Some(id)) {
            return Err(StoreError::DuplicateMobile);
        }
        let idx = self.position(id)?;
        let created = self.customers[idx].created.unwrap_or_else(Utc::now);
        let updated = form.into_customer(id, created);
        let mut next = self.customers.clone();
        next[idx] = updated.clone();
        self.commit(next)?;
        tracing::info!(id, "customer updated");
        Ok(updated)
    }

    pub fn delete(&mut self, id: i64) -> Result<Customer, StoreError> {
        let idx = self.position(id)?;
        let mut next = self.customers.clone();
        let removed = next.remove(idx);
        self.commit(next)?;
        tracing::info!(id, "customer deleted");
        Ok(removed)
    }

    fn position(&self, id: i64) -> Result<usize, StoreError> {
        self.customers
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Write `next` to disk, then make it the in-memory book. A failed write
    /// leaves the book as it was.
    fn commit(&mut self, next: Vec<Customer>) -> Result<(), StoreError> {
        write_book(&self.path, &next)?;
        self.customers = next;
        Ok(())
    }

    fn mobile_taken(&self, mobile: &str, except: Option<i64>) -> bool {
        self.customers
            .iter()
            .any(|c| c.mobile == mobile && Some(c.id) != except)
    }

    /// Millisecond timestamp, bumped past any existing id.
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let max = self.customers.iter().map(|c| c.id).max().unwrap_or(0);
        now.max(max + 1)
    }
}

fn write_book(path: &Path, customers: &[Customer]) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let data = serde_json::to_string_pretty(customers).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, data).map_err(io_err)
}

fn demo_customer() -> Customer {
    Customer {
        id: 1,
        name: "Demo Customer".into(),
        mobile: "1234567890".into(),
        address: "Sample Address, City, State".into(),
        coordinates: "23.15371, 79.753135".into(),
        map_url: Some("https://maps.google.com/?q=23.15371,79.753135".into()),
        photos: Vec::new(),
        created: None,
    }
}
