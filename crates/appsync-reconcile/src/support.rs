//! Helpers shared by the resource reconcilers.

use std::future::Future;
use std::time::Duration;

use appsync_provider::{AppSyncProvider, Page, ProviderError, TemplateSource};
use tokio_util::sync::CancellationToken;

use crate::error::{SyncError, SyncResult};

/// What a reconciler needs to address one API.
#[derive(Clone, Copy)]
pub struct ApiContext<'a> {
    pub provider: &'a dyn AppSyncProvider,
    pub templates: &'a dyn TemplateSource,
    pub api_id: &'a str,
}

/// Follows `next_token` until the listing is exhausted.
pub async fn list_all<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ProviderError>>,
{
    let mut items = Vec::new();
    let mut token = None;
    loop {
        let page = fetch(token.take()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(next) => token = Some(next),
            None => return Ok(items),
        }
    }
}

/// Awaits a delete, treating "already gone" as success.
pub(crate) async fn delete_tolerant<F>(kind: &str, key: &str, delete: F) -> SyncResult<()>
where
    F: Future<Output = Result<(), ProviderError>>,
{
    match delete.await {
        Ok(()) => {
            tracing::info!(kind, key, "deleted");
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            tracing::warn!(kind, key, "already deleted");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Sleeps for `duration` unless `cancel` fires first.
pub(crate) async fn pause(duration: Duration, cancel: &CancellationToken) -> SyncResult<()> {
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_all_follows_tokens() {
        let pages = |token: Option<String>| async move {
            match token.as_deref() {
                None => Ok(Page {
                    items: vec![1, 2],
                    next_token: Some("2".to_string()),
                }),
                Some("2") => Ok(Page::last(vec![3])),
                Some(other) => Err(ProviderError::invalid_request(other.to_string())),
            }
        };

        let items = list_all(pages).await.unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_tolerant() {
        let deleted = delete_tolerant("function", "f1", async { Ok::<(), ProviderError>(()) });
        assert!(deleted.await.is_ok());
        assert!(
            delete_tolerant("function", "f1", async {
                Err(ProviderError::not_found("function", "f1"))
            })
            .await
            .is_ok()
        );
        let err = delete_tolerant("function", "f1", async {
            Err(ProviderError::service("boom"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::Provider(_)));
    }

    #[tokio::test]
    async fn test_pause_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            pause(Duration::from_secs(60), &cancel).await,
            Err(SyncError::Cancelled)
        ));
        assert!(pause(Duration::ZERO, &CancellationToken::new()).await.is_ok());
    }
}
