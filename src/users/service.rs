//! User business operations.
//!
//! `UserServiceImpl` holds the rules; `LoggedUserService` is the decorator
//! that puts the inner-layer invocation log around every operation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::observability::InvocationLogger;
use crate::users::error::UserError;
use crate::users::model::{Page, PageRequest, User, UserRequest, UserResponse};
use crate::users::password::PasswordService;
use crate::users::repository::UserRepository;

/// Operations exposed to the HTTP layer.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(&self, request: UserRequest) -> Result<UserResponse, UserError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<UserResponse, UserError>;

    async fn get_user_by_email(&self, email: &str) -> Result<UserResponse, UserError>;

    async fn get_all_users(&self, request: PageRequest) -> Result<Page<UserResponse>, UserError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), UserError>;
}

pub struct UserServiceImpl {
    repository: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl UserServiceImpl {
    pub fn new(repository: Arc<dyn UserRepository>, passwords: Arc<dyn PasswordService>) -> Self {
        Self {
            repository,
            passwords,
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, request: UserRequest) -> Result<UserResponse, UserError> {
        request.validate()?;
        if self.repository.find_by_email(&request.email).is_some() {
            return Err(UserError::AlreadyExists(request.email));
        }

        let password_hash = self.passwords.encrypt(&request.password)?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: request.email,
            password_hash,
            full_name: request.full_name,
            role: request.role,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(user).map(UserResponse::from)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<UserResponse, UserError> {
        self.repository
            .find_by_id(&id)
            .map(UserResponse::from)
            .ok_or(UserError::NotFoundById(id))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserResponse, UserError> {
        self.repository
            .find_by_email(email)
            .map(UserResponse::from)
            .ok_or_else(|| UserError::NotFoundByEmail(email.to_string()))
    }

    async fn get_all_users(&self, request: PageRequest) -> Result<Page<UserResponse>, UserError> {
        Ok(self.repository.find_all(&request).map(UserResponse::from))
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), UserError> {
        if !self.repository.delete_by_id(&id) {
            return Err(UserError::NotFoundById(id));
        }
        Ok(())
    }
}

/// Decorator logging every call of the wrapped service.
pub struct LoggedUserService<S> {
    inner: S,
    logger: InvocationLogger,
}

impl<S: UserService> LoggedUserService<S> {
    pub fn new(inner: S, logger: InvocationLogger) -> Self {
        Self { inner, logger }
    }
}

#[async_trait]
impl<S: UserService> UserService for LoggedUserService<S> {
    async fn create_user(&self, request: UserRequest) -> Result<UserResponse, UserError> {
        let call = self
            .logger
            .service("create_user", &[&request], self.inner.create_user(request.clone()));
        call.await
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<UserResponse, UserError> {
        let call = self
            .logger
            .service("get_user_by_id", &[&id], self.inner.get_user_by_id(id));
        call.await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserResponse, UserError> {
        let call = self
            .logger
            .service("get_user_by_email", &[&email], self.inner.get_user_by_email(email));
        call.await
    }

    async fn get_all_users(&self, request: PageRequest) -> Result<Page<UserResponse>, UserError> {
        let call = self
            .logger
            .service("get_all_users", &[&request], self.inner.get_all_users(request.clone()));
        call.await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), UserError> {
        let call = self
            .logger
            .service("delete_user", &[&id], self.inner.delete_user(id));
        call.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::correlation::{establish, scope};
    use crate::observability::invocation::{Level, MemorySink};
    use crate::users::model::Role;
    use crate::users::password::Argon2PasswordService;
    use crate::users::repository::InMemoryUserRepository;

    fn service() -> (LoggedUserService<UserServiceImpl>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let inner = UserServiceImpl::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(Argon2PasswordService::new()),
        );
        (LoggedUserService::new(inner, InvocationLogger::new(sink.clone())), sink)
    }

    fn request(email: &str) -> UserRequest {
        UserRequest {
            email: email.into(),
            full_name: Some("Jane".into()),
            password: "hunter2".into(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let (service, sink) = service();

        let created = service.create_user(request("jane@x.io")).await.unwrap();
        assert_eq!(created.email, "jane@x.io");
        assert_eq!(created.role, Role::Admin);

        let by_id = service.get_user_by_id(created.id).await.unwrap();
        let by_email = service.get_user_by_email("jane@x.io").await.unwrap();
        assert_eq!(by_id, created);
        assert_eq!(by_email, created);

        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[Service] create_user |"));
        assert!(lines.iter().all(|l| !l.contains("hunter2")));
    }

    #[tokio::test]
    async fn test_duplicate_email_fails_and_is_logged() {
        let (service, sink) = service();
        service.create_user(request("dup@x.io")).await.unwrap();

        let err = scope(establish(Some("dup-req")), service.create_user(request("dup@x.io")))
            .await
            .unwrap_err();

        assert_eq!(err, UserError::AlreadyExists("dup@x.io".into()));
        let records = sink.records();
        let last = records.last().unwrap();
        assert_eq!(last.level, Level::Error);
        assert_eq!(last.correlation_id, "dup-req");
        assert!(last
            .message
            .contains("error=User with this email already exists: dup@x.io"));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected() {
        let (service, _) = service();
        let err = service.create_user(request("")).await.unwrap_err();
        assert_eq!(err, UserError::Validation("email: must not be blank".into()));
    }

    #[tokio::test]
    async fn test_missing_users() {
        let (service, sink) = service();
        let id = Uuid::new_v4();

        assert_eq!(service.get_user_by_id(id).await, Err(UserError::NotFoundById(id)));
        assert_eq!(service.delete_user(id).await, Err(UserError::NotFoundById(id)));
        assert_eq!(
            service.get_user_by_email("ghost@x.io").await,
            Err(UserError::NotFoundByEmail("ghost@x.io".into()))
        );
        assert!(sink.records().iter().all(|r| r.level == Level::Error));
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let (service, sink) = service();
        let first = service.create_user(request("one@x.io")).await.unwrap();
        service.create_user(request("two@x.io")).await.unwrap();

        service.delete_user(first.id).await.unwrap();
        let page = service.get_all_users(PageRequest::new(0, 10)).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].email, "two@x.io");

        let last = sink.lines().pop().unwrap();
        assert!(last.contains(r#"args={"arg0":{"page":0,"size":10,"sort":"UNSORTED"}}"#));
    }
}
