//! User storage.
//!
//! # Design Decisions
//! - `UserRepository` is the persistence seam; the service only sees the trait
//! - The in-memory store keeps an email index so uniqueness is enforced
//!   atomically on insert

use std::cmp::Ordering;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::users::error::UserError;
use crate::users::model::{Direction, Page, PageRequest, SortProperty, User};

/// Storage operations the user service relies on.
pub trait UserRepository: Send + Sync {
    /// Store a new user. Fails if the email is already taken.
    fn insert(&self, user: User) -> Result<User, UserError>;

    fn find_by_id(&self, id: &Uuid) -> Option<User>;

    fn find_by_email(&self, email: &str) -> Option<User>;

    fn find_all(&self, request: &PageRequest) -> Page<User>;

    /// Remove a user. Returns `false` if there was none.
    fn delete_by_id(&self, id: &Uuid) -> bool;

    fn exists_by_id(&self, id: &Uuid) -> bool {
        self.find_by_id(id).is_some()
    }
}

/// A thread-safe in-memory user store.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, user: User) -> Result<User, UserError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(UserError::AlreadyExists(user.email)),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    fn find_by_id(&self, id: &Uuid) -> Option<User> {
        self.users.get(id).map(|r| r.value().clone())
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        let id = *self.emails.get(email)?.value();
        self.find_by_id(&id)
    }

    fn find_all(&self, request: &PageRequest) -> Page<User> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();

        users.sort_by(|a, b| match request.sort {
            Some(sort) => {
                let ordering = compare(a, b, sort.property);
                match sort.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            }
            None => a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)),
        });

        let total = users.len() as u64;
        let content = users
            .into_iter()
            .skip(request.offset())
            .take(request.size as usize)
            .collect();
        Page::new(content, request, total)
    }

    fn delete_by_id(&self, id: &Uuid) -> bool {
        match self.users.remove(id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                true
            }
            None => false,
        }
    }
}

fn compare(a: &User, b: &User, property: SortProperty) -> Ordering {
    match property {
        SortProperty::Email => a.email.cmp(&b.email),
        SortProperty::FullName => a.full_name.cmp(&b.full_name),
        SortProperty::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{Role, Sort};
    use chrono::{Duration, Utc};

    fn user(email: &str, minutes_ago: i64) -> User {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "hash".into(),
            full_name: Some(email.to_uppercase()),
            role: Role::Customer,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = InMemoryUserRepository::new();
        let saved = repo.insert(user("a@b.com", 0)).unwrap();

        assert_eq!(repo.find_by_id(&saved.id).unwrap().email, "a@b.com");
        assert_eq!(repo.find_by_email("a@b.com").unwrap().id, saved.id);
        assert!(repo.find_by_email("missing@b.com").is_none());
        assert!(repo.exists_by_id(&saved.id));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(user("a@b.com", 0)).unwrap();
        let err = repo.insert(user("a@b.com", 0)).unwrap_err();
        assert_eq!(err, UserError::AlreadyExists("a@b.com".into()));
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_delete_frees_email() {
        let repo = InMemoryUserRepository::new();
        let saved = repo.insert(user("a@b.com", 0)).unwrap();
        assert!(repo.delete_by_id(&saved.id));
        assert!(!repo.delete_by_id(&saved.id));
        assert!(repo.insert(user("a@b.com", 0)).is_ok());
    }

    #[test]
    fn test_find_all_pages_and_sorts() {
        let repo = InMemoryUserRepository::new();
        for (i, email) in ["c@x.io", "a@x.io", "b@x.io"].iter().enumerate() {
            repo.insert(user(email, 10 - i as i64)).unwrap();
        }

        let by_creation = repo.find_all(&PageRequest::new(0, 2));
        let emails: Vec<_> = by_creation.content.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["c@x.io", "a@x.io"]);
        assert_eq!(by_creation.total_elements, 3);
        assert_eq!(by_creation.total_pages, 2);

        let desc = PageRequest::new(0, 10).with_sort(Sort::parse("email,desc").unwrap());
        let emails: Vec<_> = repo
            .find_all(&desc)
            .content
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(emails, vec!["c@x.io", "b@x.io", "a@x.io"]);

        let beyond = repo.find_all(&PageRequest::new(5, 10));
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 3);
    }
}
