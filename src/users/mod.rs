//! User management domain.
//!
//! # Data Flow
//! ```text
//! handler
//!     → LoggedUserService (inner invocation log)
//!     → UserServiceImpl (rules: uniqueness, hashing, paging)
//!     → UserRepository (storage seam) + PasswordService (hashing seam)
//! ```

pub mod error;
pub mod model;
pub mod password;
pub mod repository;
pub mod service;

pub use error::UserError;
pub use model::{Page, PageQuery, PageRequest, Role, User, UserRequest, UserResponse};
pub use password::{Argon2PasswordService, PasswordService};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::{LoggedUserService, UserService, UserServiceImpl};
