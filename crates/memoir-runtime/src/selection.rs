//! Year selection controls.
//!
//! One control per year in the catalog, oldest first, with at most one of
//! them marked selected.  Choosing a control starts the flyover for that
//! year through a [`FlyoverControl`].

use std::sync::Arc;

use memoir_catalog::{Catalog, years};
use memoir_types::{FlyoverError, Year};
use tracing::info;

use crate::driver::FlyoverControl;

/// A selectable year as the UI renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionControl {
    pub year: Year,
    pub label: String,
    pub selected: bool,
}

pub struct SelectionController<C> {
    catalog: Arc<Catalog>,
    target: C,
    selected: Option<Year>,
}

impl<C: FlyoverControl> SelectionController<C> {
    pub fn new(catalog: Arc<Catalog>, target: C) -> Self {
        Self {
            catalog,
            target,
            selected: None,
        }
    }

    /// Controls for every year currently in the catalog.
    pub fn controls(&self) -> Vec<SelectionControl> {
        years(&self.catalog)
            .iter()
            .map(|year| SelectionControl {
                year,
                label: year.to_string(),
                selected: self.selected == Some(year),
            })
            .collect()
    }

    /// Start the flyover for `year` and mark it selected.
    ///
    /// # Errors
    ///
    /// [`FlyoverError::UnknownYear`] if the catalog has no memories for
    /// `year`; nothing is started.  Errors from the control target are
    /// propagated and leave the selection unchanged.
    pub fn select(&mut self, year: Year) -> Result<(), FlyoverError> {
        if !years(&self.catalog).contains(year) {
            return Err(FlyoverError::UnknownYear(year));
        }
        self.target.start(year)?;
        info!(year, "year selected");
        self.selected = Some(year);
        Ok(())
    }

    /// Select the oldest year, if the catalog has any.
    pub fn auto_select(&mut self) -> Result<Option<Year>, FlyoverError> {
        let Some(first) = years(&self.catalog).first() else {
            return Ok(None);
        };
        self.select(first)?;
        Ok(Some(first))
    }

    pub fn selected(&self) -> Option<Year> {
        self.selected
    }

    pub fn target(&self) -> &C {
        &self.target
    }
}
