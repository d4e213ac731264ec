use serde_json::{json, Value};

use crate::models::{AdminUser, Page, PageRequest};

use super::pipeline::path_segment;
use super::{ApiResult, OutboundRequest, RequestPipeline};

/// Calls under `/admin/users`
#[derive(Clone)]
pub struct AdminApi {
    pipeline: RequestPipeline,
}

impl AdminApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn list_users(&self, page: PageRequest) -> ApiResult<Page<AdminUser>> {
        let endpoint = format!("/admin/users/?{}", page.query());
        self.pipeline.send(OutboundRequest::get(endpoint)).await
    }

    pub async fn grant_role(&self, user_id: &str, role: &str) -> ApiResult<Value> {
        let endpoint = format!("/admin/users/{}/grant-role", path_segment(user_id)?);
        let request = OutboundRequest::post(endpoint).body(json!({ "role": role }));
        self.pipeline.send(request).await
    }

    pub async fn revoke_role(&self, user_id: &str, role: &str) -> ApiResult<Value> {
        let endpoint = format!("/admin/users/{}/revoke-role", path_segment(user_id)?);
        let request = OutboundRequest::post(endpoint).body(json!({ "role": role }));
        self.pipeline.send(request).await
    }

    pub async fn disable_user(&self, user_id: &str, reason: &str) -> ApiResult<Value> {
        let endpoint = format!("/admin/users/{}/disable", path_segment(user_id)?);
        let request = OutboundRequest::post(endpoint).body(json!({ "reason": reason }));
        self.pipeline.send(request).await
    }

    pub async fn reenable_user(&self, user_id: &str) -> ApiResult<Value> {
        let endpoint = format!("/admin/users/{}/reenable", path_segment(user_id)?);
        self.pipeline.send(OutboundRequest::post(endpoint)).await
    }
}
