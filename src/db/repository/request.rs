//! Service request repository

use chrono::Utc;

use crate::db::models::{RequestOption, ServiceRequest};
use crate::db::{RepoError, RepoResult, Store};

#[derive(Clone)]
pub struct RequestRepository {
    store: Store,
}

impl RequestRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get_option(&self, option_id: u64) -> RepoResult<RequestOption> {
        self.store
            .inner()
            .request_options
            .get(&option_id)
            .map(|o| o.clone())
            .ok_or_else(|| RepoError::NotFound(format!("request option {option_id}")))
    }

    /// Request types a restaurant offers, sorted by name
    pub fn options_for_restaurant(&self, restaurant_id: u64) -> Vec<RequestOption> {
        let mut all: Vec<RequestOption> = self
            .store
            .inner()
            .request_options
            .iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .map(|o| o.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn create_option(&self, restaurant_id: u64, name: &str) -> RequestOption {
        let option = RequestOption {
            id: self.store.next_id(),
            restaurant_id,
            name: name.to_string(),
        };
        self.store
            .inner()
            .request_options
            .insert(option.id, option.clone());
        option
    }

    /// Whether the customer already has this request open
    pub fn duplicate_exists(&self, customer_id: u64, option_id: u64) -> bool {
        self.store
            .inner()
            .requests
            .iter()
            .any(|r| r.customer_id == customer_id && r.request_option_id == option_id)
    }

    pub fn create(&self, customer_id: u64, option_id: u64, table: i32) -> ServiceRequest {
        let request = ServiceRequest {
            id: self.store.next_id(),
            customer_id,
            request_option_id: option_id,
            table,
            requested_at: Utc::now(),
        };
        self.store
            .inner()
            .requests
            .insert(request.id, request.clone());
        request
    }

    pub fn get(&self, request_id: u64) -> RepoResult<ServiceRequest> {
        self.store
            .inner()
            .requests
            .get(&request_id)
            .map(|r| r.clone())
            .ok_or_else(|| RepoError::NotFound(format!("request {request_id}")))
    }

    pub fn delete(&self, request_id: u64) -> RepoResult<ServiceRequest> {
        self.store
            .inner()
            .requests
            .remove(&request_id)
            .map(|(_, r)| r)
            .ok_or_else(|| RepoError::NotFound(format!("request {request_id}")))
    }

    /// Open requests for a restaurant, oldest first
    pub fn open_for_restaurant(&self, restaurant_id: u64) -> Vec<(ServiceRequest, RequestOption)> {
        let mut pairs: Vec<(ServiceRequest, RequestOption)> = self
            .store
            .inner()
            .requests
            .iter()
            .filter_map(|r| {
                let option = self.store.inner().request_options.get(&r.request_option_id)?;
                (option.restaurant_id == restaurant_id).then(|| (r.clone(), option.clone()))
            })
            .collect();
        pairs.sort_by(|a, b| a.0.requested_at.cmp(&b.0.requested_at));
        pairs
    }
}
