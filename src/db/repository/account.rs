//! Account repository: users, tokens, role profiles, staff invites

use crate::db::models::{Customer, Staff, StaffInvite, User};
use crate::db::{RepoError, RepoResult, Store};

#[derive(Clone)]
pub struct AccountRepository {
    store: Store,
}

impl AccountRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // ---- users ----

    pub fn get_user(&self, user_id: u64) -> RepoResult<User> {
        self.store
            .inner()
            .users
            .get(&user_id)
            .map(|u| u.clone())
            .ok_or_else(|| RepoError::NotFound(format!("user {user_id}")))
    }

    pub fn create_user(&self, email: &str, name: Option<&str>) -> User {
        let user = User {
            id: self.store.next_id(),
            email: email.to_string(),
            name: name.map(str::to_string),
        };
        self.store.inner().users.insert(user.id, user.clone());
        user
    }

    // ---- tokens ----

    pub fn issue_token(&self, user_id: u64, token: &str) {
        self.store.inner().tokens.insert(token.to_string(), user_id);
    }

    pub fn resolve_token(&self, token: &str) -> Option<User> {
        let user_id = *self.store.inner().tokens.get(token)?;
        self.store
            .inner()
            .users
            .get(&user_id)
            .map(|u| u.clone())
    }

    // ---- customers ----

    pub fn customer_for_user(&self, user_id: u64) -> Option<Customer> {
        self.store
            .inner()
            .customers
            .iter()
            .find(|c| c.user_id == user_id)
            .map(|c| c.clone())
    }

    pub fn get_customer(&self, customer_id: u64) -> RepoResult<Customer> {
        self.store
            .inner()
            .customers
            .get(&customer_id)
            .map(|c| c.clone())
            .ok_or_else(|| RepoError::NotFound(format!("customer {customer_id}")))
    }

    pub fn create_customer(&self, user_id: u64, gateway_customer_id: &str) -> Customer {
        let customer = Customer {
            id: self.store.next_id(),
            user_id,
            gateway_customer_id: gateway_customer_id.to_string(),
        };
        self.store
            .inner()
            .customers
            .insert(customer.id, customer.clone());
        customer
    }

    // ---- staff ----

    pub fn staff_for_user(&self, user_id: u64) -> Option<Staff> {
        self.store
            .inner()
            .staff
            .iter()
            .find(|s| s.user_id == user_id)
            .map(|s| s.clone())
    }

    pub fn create_staff(&self, user_id: u64, restaurant_id: Option<u64>) -> Staff {
        let staff = Staff {
            id: self.store.next_id(),
            user_id,
            restaurant_id,
        };
        self.store.inner().staff.insert(staff.id, staff.clone());
        staff
    }

    pub fn attach_staff_to_restaurant(&self, staff_id: u64, restaurant_id: u64) -> RepoResult<()> {
        let mut entry = self
            .store
            .inner()
            .staff
            .get_mut(&staff_id)
            .ok_or_else(|| RepoError::NotFound(format!("staff {staff_id}")))?;
        entry.restaurant_id = Some(restaurant_id);
        Ok(())
    }

    // ---- staff invites ----

    pub fn create_invite(&self, email: &str, restaurant_id: u64) -> StaffInvite {
        let invite = StaffInvite {
            id: self.store.next_id(),
            email: email.to_string(),
            restaurant_id,
            accepted: false,
        };
        self.store
            .inner()
            .staff_invites
            .insert(invite.id, invite.clone());
        invite
    }

    /// Find the oldest unaccepted invite for this email and mark it accepted.
    /// Returns the restaurant the invite binds the staff member to.
    pub fn accept_invite(&self, email: &str) -> Option<u64> {
        let invite_id = self
            .store
            .inner()
            .staff_invites
            .iter()
            .filter(|i| i.email == email && !i.accepted)
            .min_by_key(|i| i.id)
            .map(|i| i.id)?;
        let mut entry = self.store.inner().staff_invites.get_mut(&invite_id)?;
        entry.accepted = true;
        Some(entry.restaurant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_resolves_to_user() {
        let store = Store::new();
        let repo = store.accounts();
        let user = repo.create_user("a@example.com", Some("Ann"));
        repo.issue_token(user.id, "tok-123");

        let resolved = repo.resolve_token("tok-123").unwrap();
        assert_eq!(resolved.id, user.id);
        assert!(repo.resolve_token("tok-999").is_none());
    }

    #[test]
    fn invite_acceptance_is_oldest_first_and_one_shot() {
        let store = Store::new();
        let repo = store.accounts();
        repo.create_invite("s@example.com", 10);
        repo.create_invite("s@example.com", 20);

        assert_eq!(repo.accept_invite("s@example.com"), Some(10));
        assert_eq!(repo.accept_invite("s@example.com"), Some(20));
        assert_eq!(repo.accept_invite("s@example.com"), None);
    }
}
