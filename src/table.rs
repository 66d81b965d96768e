//! Named, fixed-length sample tables.

use hashbrown::HashMap;
use tracing::warn;

use crate::error::{Error, Result};

/// Largest table a patch may declare, in samples.
pub const MAX_TABLE_LEN: usize = 1 << 24;

/// A named array of samples. Its length never changes after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    data: Vec<f32>,
}

impl Table {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            data: vec![0.0; len],
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Read with the index rounded to the nearest slot and clamped to the
    /// table bounds. Empty tables read as zero.
    pub fn read_clamped(&self, index: f32) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let last = (self.data.len() - 1) as f32;
        let i = index.round().clamp(0.0, last);
        self.data[i as usize]
    }

    /// Overwrite `values.len()` slots starting at `start`.
    ///
    /// Nothing is written if any slot would fall outside the table.
    pub fn write(&mut self, start: usize, values: &[f32]) -> Result<()> {
        let end = match start.checked_add(values.len()) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                return Err(Error::TableIndex {
                    name: self.name.clone(),
                    len: self.data.len(),
                    index: start.saturating_add(values.len().saturating_sub(1)),
                })
            }
        };
        self.data[start..end].copy_from_slice(values);
        Ok(())
    }
}

/// All tables of a patch, by name.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    by_name: HashMap<String, Table>,
}

impl Tables {
    /// Create a zeroed table. A second table with the same name replaces the first.
    pub fn create(&mut self, name: &str, len: usize) {
        if self.by_name.insert(name.to_string(), Table::new(name, len)).is_some() {
            warn!("table '{}' defined twice, keeping the last one", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.by_name.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
