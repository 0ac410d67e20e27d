//! In-memory repositories for tests and local development.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::types::{PageRequest, PageResponse, UserId};
use authgate_entity::permission::Permission;
use authgate_entity::user::{CreateUser, User, UserFilter, UserRole, UserStatus};

use super::{PermissionRepository, UserRepository};

/// [`UserRepository`] over a `HashMap`, counting lookups by id.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
    find_by_id_calls: AtomicUsize,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Build and insert an active user with the given PHC password hash.
    pub async fn add(&self, email: &str, password_hash: &str, role: UserRole) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.insert(user.clone()).await;
        user
    }

    /// Number of `find_by_id` calls served so far.
    pub fn find_by_id_calls(&self) -> usize {
        self.find_by_id_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&data.email)) {
            return Err(AppError::conflict("Email already in use"));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            status: data.status,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AppResult<PageResponse<User>> {
        let users = self.users.read().await;
        let mut matched: Vec<User> = users.values().filter(|u| filter.matches(u)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = matched.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = matched.into_iter().skip(offset).take(limit).collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> AppResult<bool> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> AppResult<bool> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_status(&self, id: UserId, status: UserStatus) -> AppResult<bool> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.status = status;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

/// [`PermissionRepository`] over a `HashMap`, counting lookups.
#[derive(Debug, Default)]
pub struct InMemoryPermissionRepository {
    grants: RwLock<HashMap<UserRole, BTreeSet<Permission>>>,
    find_by_role_calls: AtomicUsize,
}

impl InMemoryPermissionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the permission set of `role`.
    pub async fn seed(&self, role: UserRole, permissions: &[&str]) -> AppResult<()> {
        let set = permissions
            .iter()
            .map(|p| p.parse::<Permission>())
            .collect::<AppResult<BTreeSet<_>>>()?;
        self.grants.write().await.insert(role, set);
        Ok(())
    }

    /// Number of `find_by_role` calls served so far.
    pub fn find_by_role_calls(&self) -> usize {
        self.find_by_role_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<Permission>> {
        self.find_by_role_calls.fetch_add(1, Ordering::SeqCst);
        let grants = self.grants.read().await;
        Ok(grants
            .get(&role)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn grant(&self, role: UserRole, permission: &Permission) -> AppResult<bool> {
        let mut grants = self.grants.write().await;
        Ok(grants.entry(role).or_default().insert(permission.clone()))
    }

    async fn revoke(&self, role: UserRole, permission: &Permission) -> AppResult<bool> {
        let mut grants = self.grants.write().await;
        Ok(grants
            .get_mut(&role)
            .is_some_and(|set| set.remove(permission)))
    }
}
