use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::grid::{Cell, Grid};

/// A saved pattern: a name and the full cell matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub grid: Vec<Vec<Cell>>,
}

impl Project {
    pub fn new(name: impl Into<String>, grid: &Grid) -> Self {
        Self {
            name: name.into(),
            grid: grid.cells().to_vec(),
        }
    }

    /// Checks the matrix shape before it can replace a live grid.
    pub fn into_grid(self) -> Result<Grid> {
        Grid::from_rows(self.grid)
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_ron(&fs::read_to_string(path)?)
    }
}
