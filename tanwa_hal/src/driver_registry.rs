//! Board driver registry.
//!
//! Maps a board name (`--board` on the command line) to the factory that
//! builds its [`BoardPeripherals`]. Constructor-injected, no global state.

use tanwa_common::hal::board::{BoardFactory, BoardPeripherals};
use tanwa_common::hal::driver::HalError;
use std::collections::HashMap;
use tracing::info;

/// Registry of available board drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, BoardFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in board.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all(&mut registry);
        registry
    }

    /// Register a board factory.
    ///
    /// # Panics
    /// Panics if a board with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BoardFactory) {
        if self.factories.contains_key(name) {
            panic!("Board '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a board factory by name.
    pub fn get_factory(&self, name: &str) -> Option<BoardFactory> {
        self.factories.get(name).copied()
    }

    /// Bring up a board by name.
    ///
    /// # Errors
    /// `HalError::DriverNotFound` for an unknown name, otherwise whatever the
    /// factory reports.
    pub fn create_board(&self, name: &str) -> Result<BoardPeripherals, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        let board = factory()?;
        info!(board = board.name, "Board peripherals created");
        Ok(board)
    }

    /// List all registered board names.
    pub fn list_boards(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
