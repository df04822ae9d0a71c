use std::sync::Arc;

use axum::{
    extract::{Form, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditReport, RepairReport, Repairer, ScanOptions, Scanner};
use crate::core::{EventRecord, Tenant};
use crate::error::{AuditError, IndexError};
use crate::index::{delete_event, get_event, IndexRegistry, SearchIndex};
use crate::store::RecordStore;

pub const TENANT_ORG_HEADER: &str = "x-tenant-org";
pub const TENANT_USER_HEADER: &str = "x-tenant-user";

/// 取原始字符串再自行解析：`TRUE` / `True` 也要认，其余值返回 400 而不是静默当作 false
#[derive(Deserialize)]
pub struct RepairParams {
    #[serde(rename = "fixBrokenAcls", default)]
    pub fix_broken_acls: Option<String>,
}

/// 大小写不敏感的 true / false；空值视为 false
pub fn parse_flag(name: &str, raw: &str) -> Result<bool, ApiError> {
    let v = raw.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("false") {
        Ok(false)
    } else if v.eq_ignore_ascii_case("true") {
        Ok(true)
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid value `{raw}` for `{name}`: expected true or false"
        )))
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub indices: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub indices: Arc<IndexRegistry>,
    pub store: Arc<dyn RecordStore>,
    /// 请求未携带租户头时使用
    pub default_tenant: Tenant,
    pub options: ScanOptions,
}

impl AppState {
    fn index(&self, name: &str) -> Result<Arc<dyn SearchIndex>, ApiError> {
        self.indices
            .get(name)
            .ok_or_else(|| ApiError::NotFound(format!("unknown index `{name}`")))
    }

    fn tenant(&self, headers: &HeaderMap) -> Tenant {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        Tenant {
            organization: header(TENANT_ORG_HEADER)
                .unwrap_or_else(|| self.default_tenant.organization.clone()),
            user: header(TENANT_USER_HEADER).unwrap_or_else(|| self.default_tenant.user.clone()),
        }
    }
}

/// HTTP 错误映射
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            IndexError::Unavailable { .. } => ApiError::Unavailable(e.to_string()),
            IndexError::UnknownDocumentType(_) | IndexError::AmbiguousKey { .. } => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(e: AuditError) -> Self {
        match e {
            AuditError::Index(ie) => ie.into(),
            AuditError::Cancelled { .. } => ApiError::Unavailable(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

pub struct QueryServer {
    pub state: AppState,
}

impl QueryServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/status", get(status_handler))
            .route(
                "/:index/events/emptyacls",
                get(audit_handler).post(repair_handler),
            )
            .route(
                "/:index/events/:event_id",
                get(get_event_handler).delete(delete_event_handler),
            )
            .with_state(self.state.clone())
    }

    pub async fn run(self, listen: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(listen).await?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        let app = self.router();
        tracing::info!(
            "HTTP ACL Server listening on {} (indices: {:?})",
            listener.local_addr()?,
            self.state.indices.names()
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        indices: state.indices.names(),
    })
}

async fn audit_handler(
    State(state): State<AppState>,
    Path(index_name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AuditReport>, ApiError> {
    let index = state.index(&index_name)?;
    let tenant = state.tenant(&headers);
    let options = state.options.clone();

    let report = tokio::task::spawn_blocking(move || {
        Scanner::new(index.as_ref(), options).audit(&tenant)
    })
    .await??;
    Ok(Json(report))
}

async fn repair_handler(
    State(state): State<AppState>,
    Path(index_name): Path<String>,
    headers: HeaderMap,
    form: Option<Form<RepairParams>>,
) -> Result<Json<RepairReport>, ApiError> {
    let index = state.index(&index_name)?;
    let tenant = state.tenant(&headers);
    let store = state.store.clone();
    let options = state.options.clone();
    let include_broken = match form.and_then(|Form(p)| p.fix_broken_acls) {
        Some(raw) => parse_flag("fixBrokenAcls", &raw)?,
        None => false,
    };

    // 修复已写入内存索引：落盘失败只记日志，报告照常返回
    let report = tokio::task::spawn_blocking(move || {
        Repairer::new(index.as_ref(), store.as_ref(), options)
            .repair_and_flush(&tenant, include_broken)
    })
    .await??;
    Ok(Json(report))
}

async fn get_event_handler(
    State(state): State<AppState>,
    Path((index_name, event_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<EventRecord>, ApiError> {
    let index = state.index(&index_name)?;
    let tenant = state.tenant(&headers);

    let event =
        tokio::task::spawn_blocking(move || get_event(index.as_ref(), &tenant, &event_id)).await??;
    Ok(Json(event))
}

async fn delete_event_handler(
    State(state): State<AppState>,
    Path((index_name, event_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let index = state.index(&index_name)?;
    let tenant = state.tenant(&headers);

    tokio::task::spawn_blocking(move || {
        delete_event(index.as_ref(), &tenant, &event_id)?;
        index.flush()
    })
    .await??;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing_is_case_insensitive() {
        assert!(parse_flag("f", "true").unwrap());
        assert!(parse_flag("f", "TRUE").unwrap());
        assert!(parse_flag("f", " True ").unwrap());
        assert!(!parse_flag("f", "False").unwrap());
        assert!(!parse_flag("f", "").unwrap());
        assert!(matches!(parse_flag("f", "maybe"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_flag("f", "1"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn ambiguous_key_maps_to_internal_error() {
        let e = IndexError::AmbiguousKey {
            index: "api".into(),
            key: "a1org".into(),
            matches: 2,
        };
        let resp = ApiError::from(e).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
