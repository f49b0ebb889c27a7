//! Cart Store
//!
//! Ordered cart lines, unique by menu id. Every mutation writes the full
//! snapshot to the session storage under [`CART_KEY`]; when that write fails
//! the mutation is undone and the storage error returned, so memory and the
//! stored snapshot never disagree.
//!
//! A store built with [`CartStore::new`] is not hydrated: [`CartStore::lines`]
//! returns `None` until [`CartStore::hydrate`] has read the stored snapshot,
//! so a screen never renders a transient empty cart. Mutations hydrate first.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, MenuItem};
use shared::order;

use crate::error::{ClientError, ClientResult};
use crate::storage::{CART_KEY, SessionStorage, load_json, save_json};

#[derive(Debug)]
pub struct CartStore {
    storage: Arc<dyn SessionStorage>,
    lines: Vec<CartLine>,
    hydrated: bool,
}

impl CartStore {
    /// Unhydrated store
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            lines: Vec::new(),
            hydrated: false,
        }
    }

    /// Store rehydrated from the saved snapshot
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let mut cart = Self::new(storage);
        cart.hydrate();
        cart
    }

    /// Read the stored snapshot, replacing in-memory lines
    ///
    /// A corrupted snapshot is logged and treated as an empty cart. Lines
    /// with quantity 0 are dropped and repeated menu ids are merged into the
    /// first line, summing quantities.
    pub fn hydrate(&mut self) {
        let stored: Option<Vec<CartLine>> = match load_json(self.storage.as_ref(), CART_KEY) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("Discarding unreadable cart snapshot: {}", e);
                None
            }
        };

        let mut lines: Vec<CartLine> = Vec::new();
        for line in stored.unwrap_or_default() {
            if line.quantity == 0 {
                continue;
            }
            match lines.iter_mut().find(|l| l.menu_id == line.menu_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }
        self.lines = lines;
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Current lines, `None` before hydration
    pub fn lines(&self) -> Option<&[CartLine]> {
        self.hydrated.then_some(self.lines.as_slice())
    }

    /// Owned copy of the lines, for submission
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, menu_id: i64) -> u32 {
        self.find(menu_id).map(|l| l.quantity).unwrap_or(0)
    }

    /// Add one unit of `item`
    ///
    /// Increments the existing line or appends a new one snapshotting name,
    /// price and image. Unavailable items are rejected.
    pub fn add(&mut self, item: &MenuItem) -> ClientResult<()> {
        if !item.is_available {
            return Err(ClientError::Validation(
                AppError::with_message(
                    ErrorCode::MenuItemUnavailable,
                    format!("{} is not available", item.name),
                )
                .with_detail("menu_id", item.id),
            ));
        }
        self.ensure_hydrated();

        let previous = self.lines.clone();
        match self.lines.iter_mut().find(|l| l.menu_id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::from_menu_item(item)),
        }
        self.persist_or_restore(previous)
    }

    /// Remove one unit; the line disappears at zero. Unknown ids are ignored.
    pub fn decrement(&mut self, menu_id: i64) -> ClientResult<()> {
        self.ensure_hydrated();
        let Some(pos) = self.lines.iter().position(|l| l.menu_id == menu_id) else {
            return Ok(());
        };
        let previous = self.lines.clone();
        if self.lines[pos].quantity <= 1 {
            self.lines.remove(pos);
        } else {
            self.lines[pos].quantity -= 1;
        }
        self.persist_or_restore(previous)
    }

    /// Drop a line regardless of quantity
    pub fn remove(&mut self, menu_id: i64) -> ClientResult<()> {
        self.ensure_hydrated();
        if self.find(menu_id).is_none() {
            return Ok(());
        }
        let previous = self.lines.clone();
        self.lines.retain(|l| l.menu_id != menu_id);
        self.persist_or_restore(previous)
    }

    /// Replace a line's note; an empty string clears it
    pub fn set_note(&mut self, menu_id: i64, text: &str) -> ClientResult<()> {
        self.ensure_hydrated();
        let previous = self.lines.clone();
        let Some(line) = self.lines.iter_mut().find(|l| l.menu_id == menu_id) else {
            return Ok(());
        };
        line.note = (!text.is_empty()).then(|| text.to_string());
        self.persist_or_restore(previous)
    }

    /// Empty the cart and delete the stored snapshot
    ///
    /// Memory is emptied even when the delete fails; the error is returned
    /// so the caller can tell the stored cart may reappear on reload.
    pub fn clear(&mut self) -> ClientResult<()> {
        self.lines.clear();
        self.hydrated = true;
        self.storage.remove(CART_KEY)
    }

    /// Σ price × quantity
    pub fn total_price(&self) -> i64 {
        order::subtotal(&self.lines)
    }

    /// Σ quantity
    pub fn total_items(&self) -> u32 {
        order::total_items(&self.lines)
    }

    fn find(&self, menu_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.menu_id == menu_id)
    }

    fn ensure_hydrated(&mut self) {
        if !self.hydrated {
            self.hydrate();
        }
    }

    fn persist_or_restore(&mut self, previous: Vec<CartLine>) -> ClientResult<()> {
        if let Err(e) = save_json(self.storage.as_ref(), CART_KEY, &self.lines) {
            tracing::warn!("Failed to persist cart: {}", e);
            self.lines = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn menu(id: i64, name: &str, price: i64) -> MenuItem {
        MenuItem {
            id,
            name: name.into(),
            price,
            category: "Makanan".into(),
            image_url: None,
            is_available: true,
            created_at: 0,
        }
    }

    fn storage() -> Arc<dyn SessionStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn test_add_increments_existing_line() {
        let mut cart = CartStore::load(storage());
        let nasi = menu(1, "Nasi Goreng", 20000);
        let teh = menu(2, "Es Teh", 5000);

        cart.add(&nasi).unwrap();
        cart.add(&nasi).unwrap();
        cart.add(&teh).unwrap();

        let lines = cart.lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[1].menu_id, 2);
        assert_eq!(cart.total_price(), 45000);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let mut cart = CartStore::load(storage());
        cart.add(&menu(1, "Sate", 25000)).unwrap();

        cart.decrement(1).unwrap();
        assert!(cart.is_empty());

        // Unknown id
        cart.decrement(99).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_never_zero() {
        let mut cart = CartStore::load(storage());
        let item = menu(7, "Bakso", 18000);
        for step in [true, true, false, false, false, true, false] {
            if step {
                cart.add(&item).unwrap();
            } else {
                cart.decrement(item.id).unwrap();
            }
            assert!(cart.lines().unwrap().iter().all(|l| l.quantity >= 1));
        }
    }

    #[test]
    fn test_unavailable_item_rejected() {
        let mut cart = CartStore::load(storage());
        let mut item = menu(3, "Soto", 22000);
        item.is_available = false;

        let err = cart.add(&item).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MenuItemUnavailable));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_note_and_clear_note() {
        let mut cart = CartStore::load(storage());
        cart.add(&menu(1, "Mie Ayam", 15000)).unwrap();

        cart.set_note(1, "tanpa sambal").unwrap();
        assert_eq!(cart.lines().unwrap()[0].note.as_deref(), Some("tanpa sambal"));
        cart.set_note(1, "").unwrap();
        assert_eq!(cart.lines().unwrap()[0].note, None);
    }

    #[test]
    fn test_unhydrated_until_hydrate() {
        let storage = storage();
        {
            let mut cart = CartStore::load(storage.clone());
            cart.add(&menu(1, "Kopi", 8000)).unwrap();
        }

        let mut cart = CartStore::new(storage);
        assert!(cart.lines().is_none());
        cart.hydrate();
        assert_eq!(cart.lines().unwrap().len(), 1);
    }

    #[test]
    fn test_mutation_before_hydrate_keeps_stored_lines() {
        let storage = storage();
        CartStore::load(storage.clone()).add(&menu(1, "Kopi", 8000)).unwrap();

        let mut cart = CartStore::new(storage.clone());
        cart.add(&menu(2, "Roti", 6000)).unwrap();

        let reloaded = CartStore::load(storage);
        assert_eq!(reloaded.lines().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupted_snapshot_is_empty() {
        let storage = storage();
        storage.set(CART_KEY, "[{\"menu_id\": ").unwrap();
        let cart = CartStore::load(storage);
        assert_eq!(cart.lines().map(<[CartLine]>::len), Some(0));
    }

    #[test]
    fn test_remove_and_clear_persist() {
        let storage = storage();
        let mut cart = CartStore::load(storage.clone());
        cart.add(&menu(1, "Kopi", 8000)).unwrap();
        cart.add(&menu(2, "Roti", 6000)).unwrap();

        cart.remove(1).unwrap();
        assert_eq!(CartStore::load(storage.clone()).total_items(), 1);

        cart.clear().unwrap();
        assert!(CartStore::load(storage.clone()).is_empty());
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
    }

    /// Accepts `allowed_writes` writes, then fails every write and delete
    #[derive(Debug)]
    struct FlakyStorage {
        inner: MemoryStorage,
        allowed_writes: AtomicUsize,
    }

    impl FlakyStorage {
        fn new(allowed_writes: usize) -> Self {
            Self {
                inner: MemoryStorage::new(),
                allowed_writes: AtomicUsize::new(allowed_writes),
            }
        }

        fn take_write(&self) -> ClientResult<()> {
            self.allowed_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .map(|_| ())
                .map_err(|_| ClientError::Storage("disk full".into()))
        }
    }

    impl SessionStorage for FlakyStorage {
        fn get(&self, key: &str) -> ClientResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> ClientResult<()> {
            self.take_write()?;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> ClientResult<()> {
            self.take_write()?;
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_write_rolls_back_memory() {
        let storage: Arc<dyn SessionStorage> = Arc::new(FlakyStorage::new(1));
        let mut cart = CartStore::load(storage.clone());
        let kopi = menu(1, "Kopi", 8000);
        cart.add(&kopi).unwrap();

        let err = cart.add(&kopi).unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        assert_eq!(cart.quantity_of(1), 1);

        assert!(cart.set_note(1, "panas").is_err());
        assert_eq!(cart.lines().unwrap()[0].note, None);
        assert!(cart.decrement(1).is_err());
        assert!(cart.remove(1).is_err());
        assert_eq!(cart.quantity_of(1), 1);

        assert_eq!(CartStore::load(storage).quantity_of(1), 1);
    }

    #[test]
    fn test_failed_clear_reports_error() {
        let storage: Arc<dyn SessionStorage> = Arc::new(FlakyStorage::new(1));
        let mut cart = CartStore::load(storage);
        cart.add(&menu(1, "Kopi", 8000)).unwrap();

        assert!(matches!(cart.clear(), Err(ClientError::Storage(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_hydrate_merges_repeated_menu_ids() {
        let storage = storage();
        let kopi = CartLine::from_menu_item(&menu(1, "Kopi", 8000));
        let roti = CartLine::from_menu_item(&menu(2, "Roti", 6000));
        let again = CartLine {
            quantity: 2,
            ..kopi.clone()
        };
        save_json(storage.as_ref(), CART_KEY, &vec![kopi, roti, again]).unwrap();

        let cart = CartStore::load(storage);
        let lines = cart.lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].menu_id, 1);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(cart.total_price(), 30000);
    }
}
