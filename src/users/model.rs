//! User entities, transfer objects and paging types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::observability::sanitize::{Sanitize, SanitizedValue, Sanitizer};
use crate::sanitize_struct;
use crate::users::error::UserError;

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Admin => "ADMIN",
        }
    }
}

impl Sanitize for Role {
    fn sanitize(&self, _cx: &mut Sanitizer) -> SanitizedValue {
        Value::from(self.as_str())
    }
}

/// Stored user.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

sanitize_struct!(User {
    id,
    email,
    #[sensitive] password_hash,
    full_name,
    role,
    created_at,
    updated_at,
});

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Payload for creating a user.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub password: String,
    pub role: Role,
}

sanitize_struct!(UserRequest {
    email,
    full_name,
    #[sensitive] password,
    role,
});

impl fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRequest")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &"***")
            .field("role", &self.role)
            .finish()
    }
}

impl UserRequest {
    /// Check the payload; reports the first failing field.
    pub fn validate(&self) -> Result<(), UserError> {
        if self.email.trim().is_empty() {
            return Err(UserError::validation("email", "must not be blank"));
        }
        if !is_email(&self.email) {
            return Err(UserError::validation("email", "must be a well-formed email address"));
        }
        if self.password.trim().is_empty() {
            return Err(UserError::validation("password", "must not be blank"));
        }
        Ok(())
    }
}

fn is_email(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    match candidate.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// User as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

sanitize_struct!(UserResponse {
    id,
    email,
    full_name,
    role,
    created_at,
    updated_at,
});

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Properties a user listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    Email,
    FullName,
    CreatedAt,
}

impl SortProperty {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "email" => Some(Self::Email),
            "fullName" => Some(Self::FullName),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FullName => "fullName",
            Self::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub property: SortProperty,
    pub direction: Direction,
}

impl Sort {
    /// Parse `property[,asc|desc]`.
    pub fn parse(spec: &str) -> Result<Self, UserError> {
        let (property, direction) = match spec.split_once(',') {
            Some((property, direction)) => (property.trim(), Some(direction.trim())),
            None => (spec.trim(), None),
        };

        let property = SortProperty::parse(property).ok_or_else(|| {
            UserError::Validation(format!("sort: unknown property '{property}'"))
        })?;
        let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(UserError::Validation(format!(
                    "sort: unknown direction '{other}'"
                )))
            }
        };

        Ok(Self { property, direction })
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        write!(f, "{}: {}", self.property.as_str(), direction)
    }
}

/// Raw paging parameters from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

sanitize_struct!(PageQuery { page, size, sort });

/// Validated paging descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Resolve query parameters against the configured paging limits.
    pub fn from_query(query: &PageQuery, limits: &PaginationConfig) -> Result<Self, UserError> {
        let size = match query.size {
            None => limits.default_size,
            Some(0) => return Err(UserError::validation("size", "must be greater than 0")),
            Some(size) => size.min(limits.max_size),
        };
        let sort = query.sort.as_deref().map(Sort::parse).transpose()?;

        Ok(Self {
            page: query.page.unwrap_or(0),
            size,
            sort,
        })
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }

    fn sort_text(&self) -> String {
        self.sort
            .map(|sort| sort.to_string())
            .unwrap_or_else(|| "UNSORTED".to_string())
    }
}

impl Sanitize for PageRequest {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.object(self, |o| {
            o.field("page", &self.page)
                .field("size", &self.size)
                .computed("sort", self.sort_text());
        })
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size.max(1));
        let total_pages = u32::try_from(total_elements.div_ceil(size)).unwrap_or(u32::MAX);
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

impl<T: Sanitize> Sanitize for Page<T> {
    fn sanitize(&self, cx: &mut Sanitizer) -> SanitizedValue {
        cx.object(self, |o| {
            o.field("content", &self.content)
                .field("page", &self.page)
                .field("size", &self.size)
                .field("total_elements", &self.total_elements)
                .field("total_pages", &self.total_pages);
        })
    }
}
