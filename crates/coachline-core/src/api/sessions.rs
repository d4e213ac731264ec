use serde_json::Value;

use crate::models::{NewSession, Page, Session};

use super::pipeline::path_segment;
use super::{ApiResult, OutboundRequest, RequestPipeline};

/// Calls under `/sessions`
#[derive(Clone)]
pub struct SessionsApi {
    pipeline: RequestPipeline,
}

impl SessionsApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn list(&self) -> ApiResult<Page<Session>> {
        self.pipeline.send(OutboundRequest::get("/sessions")).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Session> {
        let endpoint = format!("/sessions/{}", path_segment(id)?);
        self.pipeline.send(OutboundRequest::get(endpoint)).await
    }

    pub async fn create(&self, session: &NewSession) -> ApiResult<Session> {
        let request = OutboundRequest::post("/sessions").json(session)?;
        self.pipeline.send(request).await
    }

    pub async fn cancel(&self, id: &str) -> ApiResult<Value> {
        let endpoint = format!("/sessions/{}/cancel", path_segment(id)?);
        self.pipeline.send(OutboundRequest::put(endpoint)).await
    }
}
