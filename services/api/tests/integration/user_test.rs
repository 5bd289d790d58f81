use std::sync::Arc;

use uuid::Uuid;

use hackers_api::domain::types::ProfileUpdate;
use hackers_api::error::ApiError;
use hackers_api::usecase::post::GetPostUseCase;
use hackers_api::usecase::user::{
    DeleteUserUseCase, GetUserUseCase, UpdateProfileUseCase, UploadAvatarUseCase,
};

use crate::helpers::{MemoryImageStore, MockPostRepo, MockUserRepo};

#[tokio::test]
async fn should_update_own_profile() {
    let users = MockUserRepo::empty();
    let user = users.seed("alice", "a@x.com", "p1").await;

    let updated = UpdateProfileUseCase {
        users: users.clone(),
    }
    .execute(
        user.id,
        user.id,
        ProfileUpdate {
            caption: Some("hi".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.caption, "hi");
    assert_eq!(users.get(user.id).unwrap().caption, "hi");
    assert_eq!(users.get(user.id).unwrap().password_hash, user.password_hash);
}

#[tokio::test]
async fn should_forbid_updating_someone_else() {
    let users = MockUserRepo::empty();
    let alice = users.seed("alice", "a@x.com", "p1").await;
    let bob = users.seed("bob", "b@x.com", "p2").await;

    let err = UpdateProfileUseCase {
        users: users.clone(),
    }
    .execute(
        bob.id,
        alice.id,
        ProfileUpdate {
            bio: Some("pwned".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::Forbidden));
    assert_ne!(users.get(alice.id).unwrap().bio, "pwned");
}

#[tokio::test]
async fn should_reject_empty_profile_update() {
    let users = MockUserRepo::empty();
    let user = users.seed("alice", "a@x.com", "p1").await;

    let err = UpdateProfileUseCase {
        users: users.clone(),
    }
    .execute(user.id, user.id, ProfileUpdate::default())
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::MissingData));
}

#[tokio::test]
async fn should_delete_own_account() {
    let users = MockUserRepo::empty();
    let user = users.seed("alice", "a@x.com", "p1").await;
    let usecase = DeleteUserUseCase {
        users: users.clone(),
    };

    usecase.execute(user.id, user.id).await.unwrap();
    assert!(users.get(user.id).is_none());

    let err = usecase.execute(user.id, user.id).await.unwrap_err();
    assert!(matches!(err, ApiError::UserNotFound));
}

#[tokio::test]
async fn should_return_not_found_for_unknown_user() {
    let err = GetUserUseCase {
        users: MockUserRepo::empty(),
    }
    .execute(Uuid::new_v4())
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::UserNotFound));
}

#[tokio::test]
async fn should_store_avatar_and_record_url() {
    let users = MockUserRepo::empty();
    let user = users.seed("alice", "a@x.com", "p1").await;
    let images = MemoryImageStore::default();

    let url = UploadAvatarUseCase {
        users: users.clone(),
        images: Arc::new(images.clone()),
    }
    .execute(user.id, user.id, "data:image/png;base64,aGVsbG8=")
    .await
    .unwrap();

    assert_eq!(images.uploads.lock().unwrap()[0], b"hello");
    assert_eq!(users.get(user.id).unwrap().avatar.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn should_reject_undecodable_avatar() {
    let users = MockUserRepo::empty();
    let user = users.seed("alice", "a@x.com", "p1").await;
    let images = MemoryImageStore::default();

    let err = UploadAvatarUseCase {
        users: users.clone(),
        images: Arc::new(images.clone()),
    }
    .execute(user.id, user.id, "%%%")
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::InvalidImage));
    assert!(images.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_fetch_post_by_id() {
    let posts = MockPostRepo::default();
    let post = posts.seed("Hello World", None);
    let usecase = GetPostUseCase {
        posts: posts.clone(),
    };

    assert_eq!(usecase.execute(post.id).await.unwrap().title, "Hello World");
    let err = usecase.execute(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::PostNotFound));
}
