use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::ProviderError;
use tokio::sync::broadcast;

/// The `request` half and the `chainChanged` half of an EIP-1193 provider.
#[async_trait]
pub trait Eip1193Transport: Send + Sync + 'static {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Hex encoded chain ids, one per `chainChanged` notification.
    fn chain_changed(&self) -> broadcast::Receiver<String>;

    fn is_connected(&self) -> bool {
        true
    }
}

pub(crate) async fn request_as<T, R>(
    transport: &T,
    method: &str,
    params: Value,
) -> Result<R, ProviderError>
where
    T: Eip1193Transport + ?Sized,
    R: DeserializeOwned,
{
    let value = transport.request(method, params).await?;
    serde_json::from_value(value).map_err(|err| {
        ProviderError::transport(format!("unexpected {method} result: {err}"))
    })
}
