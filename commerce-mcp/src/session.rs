//! Cart sessions for the MCP server
//!
//! Each session owns one [`CartStore`] behind its own mutex, so mutations
//! and checkout on a cart are serialized while separate carts proceed
//! independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use commerce_core::{CartStore, CheckoutPolicy, CommerceConfig, CommerceError, TrustClassifier};

use crate::error::{McpError, McpResult};

/// One agent's cart
#[derive(Debug)]
pub struct CartSession {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub cart: CartStore,
}

impl CartSession {
    fn new(cart: CartStore) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            cart,
        }
    }

    /// Session duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

/// Manages all open cart sessions
pub struct SessionManager {
    config: CommerceConfig,
    classifier: Arc<dyn TrustClassifier>,
    policy: CheckoutPolicy,
    sessions: RwLock<HashMap<String, Arc<Mutex<CartSession>>>>,
}

impl SessionManager {
    pub fn new(config: CommerceConfig) -> Self {
        let classifier = config.classifier();
        let policy = config.checkout_policy();
        Self {
            config,
            classifier,
            policy,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CommerceConfig {
        &self.config
    }

    pub fn policy(&self) -> &CheckoutPolicy {
        &self.policy
    }

    /// Open a session with an empty cart at the configured budget
    pub fn open_session(&self) -> McpResult<String> {
        let session = CartSession::new(self.config.new_cart(Arc::clone(&self.classifier)));
        let session_id = session.session_id.clone();

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| McpError::Internal("Lock poisoned".to_string()))?;
        sessions.insert(session_id.clone(), Arc::new(Mutex::new(session)));

        tracing::info!(session_id = %session_id, budget = self.config.default_budget, "Cart session opened");
        Ok(session_id)
    }

    /// Close a session, dropping its cart
    pub fn close_session(&self, session_id: &str) -> McpResult<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| McpError::Internal("Lock poisoned".to_string()))?;

        let removed = sessions
            .remove(session_id)
            .ok_or_else(|| McpError::SessionNotFound(session_id.to_string()))?;

        if let Ok(session) = removed.lock() {
            tracing::info!(
                session_id = %session_id,
                duration_ms = session.duration_ms(),
                items_left = session.cart.len(),
                "Cart session closed"
            );
        }
        Ok(())
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(session_id))
            .unwrap_or(false)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Run `f` with exclusive access to the session's cart
    ///
    /// The cart lock is held for the whole call, so a checkout inside `f`
    /// sees no interleaved adds or removes.
    pub fn with_cart<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut CartStore, &CheckoutPolicy) -> T,
    ) -> McpResult<T> {
        let handle = {
            let sessions = self
                .sessions
                .read()
                .map_err(|_| McpError::Internal("Lock poisoned".to_string()))?;
            sessions
                .get(session_id)
                .cloned()
                .ok_or_else(|| McpError::SessionNotFound(session_id.to_string()))?
        };

        let mut session = handle.lock().map_err(|_| CommerceError::CartLocked)?;
        Ok(f(&mut session.cart, &self.policy))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(CommerceConfig::default())
    }
}
