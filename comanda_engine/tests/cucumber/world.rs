use std::collections::HashMap;

use comanda_common::Colones;
use comanda_engine::{
    cart_types::{Branch, BranchId, CartSession, ProductId},
    checkout_objects::CheckoutStep,
    memory::{MemoryBackend, MemorySelectionStore},
    CartError,
    CartSessionApi,
    CheckoutApi,
    CurrencyDisplay,
    PaymentSelectorApi,
};
use cucumber::World;

#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct ComandaWorld {
    pub backend: MemoryBackend,
    pub store: MemorySelectionStore,
    pub cart: CartSessionApi<MemoryBackend>,
    pub checkout: Option<CheckoutApi<MemoryBackend, MemorySelectionStore>>,
    pub payments: PaymentSelectorApi<MemoryBackend, MemorySelectionStore>,
    pub display: CurrencyDisplay,
    pub products: HashMap<String, ProductId>,
    pub branches: HashMap<String, BranchId>,
    pub last_cart: Option<CartSession>,
    pub last_step: Option<CheckoutStep>,
    pub last_error: Option<CartError>,
}

impl ComandaWorld {
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let store = MemorySelectionStore::new();
        Self {
            cart: CartSessionApi::new(backend.clone()),
            payments: PaymentSelectorApi::new(backend.clone(), store.clone()),
            checkout: None,
            display: CurrencyDisplay::default(),
            products: HashMap::new(),
            branches: HashMap::new(),
            last_cart: None,
            last_step: None,
            last_error: None,
            backend,
            store,
        }
    }

    pub fn add_product(&mut self, name: &str, price: i64) {
        let id = ProductId(self.products.len() as i64 + 1);
        self.backend.add_menu_item(id, name, Colones::from(price));
        self.products.insert(name.to_string(), id);
    }

    pub fn product(&self, name: &str) -> ProductId {
        *self.products.get(name).unwrap_or_else(|| panic!("{name} is not on the menu"))
    }

    pub fn add_branch(&mut self, name: &str, province: &str) {
        let id = BranchId(self.branches.len() as i64 + 1);
        self.backend.add_branch(Branch {
            id,
            name: name.to_string(),
            address: format!("Centro de {province}"),
            province: province.to_string(),
        });
        self.branches.insert(name.to_string(), id);
    }

    pub fn branch(&self, name: &str) -> BranchId {
        *self.branches.get(name).unwrap_or_else(|| panic!("There is no branch called {name}"))
    }

    /// The most recent cart: from the last operation if it returned one, otherwise the session's copy.
    pub async fn current_cart(&self) -> CartSession {
        match &self.last_cart {
            Some(cart) => cart.clone(),
            None => self.cart.snapshot().await.expect("The cart has not been loaded"),
        }
    }

    pub fn record<T>(&mut self, result: Result<T, CartError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                self.last_error = Some(e);
                None
            },
        }
    }
}
