//! Mock filter wheel capability.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::capabilities::{CapabilityError, FilterWheel};

/// Mock implementation of [`FilterWheel`]. Filter changes are instant.
pub struct MockFilterWheel {
    current: Mutex<String>,
}

impl Default for MockFilterWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFilterWheel {
    pub fn new() -> Self {
        Self {
            current: Mutex::new("clear".to_string()),
        }
    }
}

#[async_trait]
impl FilterWheel for MockFilterWheel {
    async fn set_filter(&self, name: &str) -> Result<(), CapabilityError> {
        *self.current.lock().unwrap() = name.to_string();
        Ok(())
    }

    async fn current_filter(&self) -> Result<String, CapabilityError> {
        Ok(self.current.lock().unwrap().clone())
    }
}
