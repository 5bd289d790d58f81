use std::path::PathBuf;

use anyhow::Context as _;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::domain::repository::ImageStore;
use crate::error::ApiError;

/// Stores uploads as `<dir>/<uuid>.png`, served under `public_base`.
pub struct LocalImageStore {
    dir: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    pub async fn new(dir: PathBuf, public_base: impl Into<String>) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create upload dir {}", dir.display()))?;
        Ok(Self {
            dir,
            public_base: public_base.into().trim_end_matches('/').to_owned(),
        })
    }
}

impl ImageStore for LocalImageStore {
    fn upload(&self, bytes: Vec<u8>) -> BoxFuture<'_, Result<String, ApiError>> {
        Box::pin(async move {
            let name = format!("{}.png", Uuid::new_v4());
            let path = self.dir.join(&name);
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("write image {}", path.display()))?;
            Ok(format!("{}/{name}", self.public_base))
        })
    }
}
