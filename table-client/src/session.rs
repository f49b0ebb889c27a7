//! Customer session: display name chosen on the welcome screen

use std::sync::Arc;

use shared::error::ErrorCode;

use crate::error::{ClientError, ClientResult};
use crate::storage::{CUSTOMER_NAME_KEY, SessionStorage, load_json, save_json};

/// Greeting name used when the customer never entered one
pub const DEFAULT_CUSTOMER_NAME: &str = "Sobat";

const MAX_CUSTOMER_NAME_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct Session {
    storage: Arc<dyn SessionStorage>,
}

impl Session {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Stored name, if any
    pub fn stored_customer_name(&self) -> Option<String> {
        match load_json::<String>(self.storage.as_ref(), CUSTOMER_NAME_KEY) {
            Ok(name) => name.and_then(|n| shared::util::non_blank(&n)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable customer name: {}", e);
                None
            }
        }
    }

    /// Stored name or [`DEFAULT_CUSTOMER_NAME`]
    pub fn customer_name(&self) -> String {
        self.stored_customer_name()
            .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string())
    }

    /// Save a trimmed, non-blank name
    pub fn set_customer_name(&self, name: &str) -> ClientResult<String> {
        let Some(name) = shared::util::non_blank(name) else {
            return Err(ClientError::validation(ErrorCode::CustomerNameRequired));
        };
        if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(ClientError::validation(ErrorCode::ValueOutOfRange));
        }
        save_json(self.storage.as_ref(), CUSTOMER_NAME_KEY, &name)?;
        Ok(name)
    }

    pub fn forget(&self) -> ClientResult<()> {
        self.storage.remove(CUSTOMER_NAME_KEY)
    }
}
