use crate::service::QnaService;

/// Publish the knowledge base; true if the service accepted it
pub async fn publish_knowledge_base<S: QnaService + ?Sized>(
    service: &S,
    kb_id: &str,
) -> anyhow::Result<bool> {
    let status = service.publish_knowledge_base(kb_id).await?;
    if status.is_success() {
        tracing::info!("Publish request succeeded - HTTP status {status}");
    } else {
        tracing::error!("Publish request failed - HTTP status {status}");
    }
    Ok(status.is_success())
}

/// Fetch the primary runtime key. A refused request or an empty key both
/// count as failure, since no query can be authorized without it.
pub async fn fetch_endpoint_key<S: QnaService + ?Sized>(
    service: &S,
) -> anyhow::Result<Option<String>> {
    let reply = service.get_endpoint_keys().await?;
    if !reply.is_success() {
        tracing::error!("GetEndpointKeys request failed - HTTP status {}", reply.status);
        return Ok(None);
    }

    match reply
        .body
        .and_then(|keys| keys.primary_endpoint_key)
        .filter(|key| !key.is_empty())
    {
        Some(key) => {
            tracing::info!("GetEndpointKeys request succeeded - HTTP status {}", reply.status);
            Ok(Some(key))
        }
        None => {
            tracing::error!("GetEndpointKeys returned no primary endpoint key");
            Ok(None)
        }
    }
}

/// Delete the knowledge base; true if the service accepted it
pub async fn delete_knowledge_base<S: QnaService + ?Sized>(
    service: &S,
    kb_id: &str,
) -> anyhow::Result<bool> {
    let status = service.delete_knowledge_base(kb_id).await?;
    if status.is_success() {
        tracing::info!("Deleted knowledge base {kb_id} - HTTP status {status}");
    } else {
        tracing::error!("Delete of knowledge base {kb_id} failed - HTTP status {status}");
    }
    Ok(status.is_success())
}
