use crate::domain::password::PasswordHasher;
use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::ApiError;

pub struct RegisterInput {
    pub handle: String,
    pub password: String,
    pub email: String,
}

/// Create an account. No token is issued; the caller logs in separately.
///
/// Both uniqueness checks are read-then-write without a lock, so two
/// concurrent registrations for the same email can both pass.
pub struct RegisterUseCase<U: UserRepository> {
    pub users: U,
    pub hasher: PasswordHasher,
}

impl<U: UserRepository> RegisterUseCase<U> {
    pub async fn execute(&self, input: RegisterInput) -> Result<User, ApiError> {
        if self.users.find_by_handle(&input.handle).await?.is_some() {
            return Err(ApiError::HandleTaken(input.handle));
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(ApiError::EmailTaken(input.email));
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        let user = User::new(input.handle, input.email, password_hash);
        self.users.create(&user).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }
}
