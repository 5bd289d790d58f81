use std::sync::Arc;

use axum::extract::FromRef;

use hackers_auth_types::token::TokenIssuer;

use crate::domain::password::PasswordHasher;
use crate::domain::repository::{ImageStore, Mailer, Persistence};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState<P: Persistence> {
    pub persistence: P,
    pub tokens: TokenIssuer,
    pub hasher: PasswordHasher,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageStore>,
    /// Reset emails link to `<reset_link_base>?token=<token>`.
    pub reset_link_base: String,
}

impl<P: Persistence> AppState<P> {
    pub fn user_repo(&self) -> P::Users {
        self.persistence.users()
    }

    pub fn code_repo(&self) -> P::Codes {
        self.persistence.codes()
    }

    pub fn post_repo(&self) -> P::Posts {
        self.persistence.posts()
    }

    pub fn comment_repo(&self) -> P::Comments {
        self.persistence.comments()
    }

    pub fn category_repo(&self) -> P::Categories {
        self.persistence.categories()
    }
}

impl<P: Persistence> FromRef<AppState<P>> for TokenIssuer {
    fn from_ref(state: &AppState<P>) -> Self {
        state.tokens.clone()
    }
}
