//! Entity store and repositories
//!
//! The store is an in-process map-per-table structure; repositories layer
//! typed CRUD and the domain's lookup queries on top of it. Persistence
//! itself lives outside this service, so the store's job is correct
//! single-process semantics, not durability.

pub mod models;
pub mod repository;

pub use repository::{
    AccountRepository, CatalogRepository, OrderRepository, RepoError, RepoResult,
    RequestRepository,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use models::{
    Category, Customer, Customization, Meal, Order, OrderItem, RequestOption, Restaurant,
    ServiceRequest, Staff, StaffInvite, TaxCategory, User,
};

/// Shared entity store, cheap to clone
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    id_seq: AtomicU64,
    pub users: DashMap<u64, User>,
    /// token -> user id
    pub tokens: DashMap<String, u64>,
    pub customers: DashMap<u64, Customer>,
    pub staff: DashMap<u64, Staff>,
    pub staff_invites: DashMap<u64, StaffInvite>,
    pub restaurants: DashMap<u64, Restaurant>,
    pub tax_categories: DashMap<u64, TaxCategory>,
    pub categories: DashMap<u64, Category>,
    pub meals: DashMap<u64, Meal>,
    pub customizations: DashMap<u64, Customization>,
    pub orders: DashMap<u64, Order>,
    pub order_items: DashMap<u64, OrderItem>,
    pub request_options: DashMap<u64, RequestOption>,
    pub requests: DashMap<u64, ServiceRequest>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                id_seq: AtomicU64::new(1),
                users: DashMap::new(),
                tokens: DashMap::new(),
                customers: DashMap::new(),
                staff: DashMap::new(),
                staff_invites: DashMap::new(),
                restaurants: DashMap::new(),
                tax_categories: DashMap::new(),
                categories: DashMap::new(),
                meals: DashMap::new(),
                customizations: DashMap::new(),
                orders: DashMap::new(),
                order_items: DashMap::new(),
                request_options: DashMap::new(),
                requests: DashMap::new(),
            }),
        }
    }

    /// Allocate the next entity id (shared sequence across tables)
    pub fn next_id(&self) -> u64 {
        self.inner.id_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn inner(&self) -> &StoreInner {
        &self.inner
    }

    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.clone())
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.clone())
    }

    pub fn requests(&self) -> RequestRepository {
        RequestRepository::new(self.clone())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
