use crate::core::{composite_key, EventRecord, Tenant, EVENT_DOCUMENT_TYPE};
use crate::error::IndexError;
use crate::index::{EventQuery, SearchIndex};

/// 按 identifier 取单个事件（租户范围内）
pub fn get_event(index: &dyn SearchIndex, tenant: &Tenant, id: &str) -> Result<EventRecord, IndexError> {
    let query = EventQuery::new(tenant).with_identifier(id).with_limit(1);
    index
        .query(&query)?
        .items
        .into_iter()
        .next()
        .ok_or_else(|| IndexError::NotFound {
            index: index.name().to_string(),
            id: id.to_string(),
        })
}

/// 从索引中删除事件；audit / repair 从不调用
pub fn delete_event(index: &dyn SearchIndex, tenant: &Tenant, id: &str) -> Result<(), IndexError> {
    index
        .delete(EVENT_DOCUMENT_TYPE, &composite_key(id, &tenant.organization))
        .map_err(|e| match e {
            IndexError::NotFound { index, .. } => IndexError::NotFound {
                index,
                id: id.to_string(),
            },
            other => other,
        })?;
    tracing::info!("Removed event {} from {} index.", id, index.name());
    Ok(())
}
