//! Site shield map endpoints

use std::sync::Arc;

use propgrid_common::validation::Validate;
use propgrid_domain::{GetSiteShieldMapsResponse, SiteShieldMap, SiteShieldMapRequest};
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::errors::{expect_data, ClientResult, Operation, OperationExt};
use crate::session::{ApiRequest, RequestContext, Session};

/// Client for the `/siteshield/v1` endpoints
#[derive(Debug, Clone)]
pub struct SiteShield {
    session: Arc<Session>,
}

impl SiteShield {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// List every site shield map visible to the account
    #[instrument(skip_all)]
    pub async fn get_site_shield_maps(
        &self,
        ctx: &RequestContext,
    ) -> ClientResult<GetSiteShieldMapsResponse> {
        let op = Operation::GetSiteShieldMaps;
        debug!("fetching site shield maps");

        let response =
            self.session.exec(ctx, ApiRequest::get("/siteshield/v1/maps")).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }

    #[instrument(skip_all, fields(unique_id = params.unique_id))]
    pub async fn get_site_shield_map(
        &self,
        ctx: &RequestContext,
        params: &SiteShieldMapRequest,
    ) -> ClientResult<SiteShieldMap> {
        let op = Operation::GetSiteShieldMap;
        params.validate().during(op)?;
        debug!("fetching site shield map");

        let request = ApiRequest::get(format!("/siteshield/v1/maps/{}", params.unique_id));
        let response = self.session.exec(ctx, request).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }

    /// Acknowledge the proposed CIDR changes of a map
    #[instrument(skip_all, fields(unique_id = params.unique_id))]
    pub async fn ack_site_shield_map(
        &self,
        ctx: &RequestContext,
        params: &SiteShieldMapRequest,
    ) -> ClientResult<SiteShieldMap> {
        let op = Operation::AckSiteShieldMap;
        params.validate().during(op)?;
        debug!("acknowledging site shield map");

        let request = ApiRequest::post(format!("/siteshield/v1/maps/{}/acknowledge", params.unique_id));
        let response = self.session.exec_with_body(ctx, request, params).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }
}
