use propgrid_common::validation::Validate;
use propgrid_domain::{SearchRequest, SearchResponse};
use reqwest::StatusCode;
use tracing::{debug, instrument};

use super::Papi;
use crate::errors::{expect_data, ClientResult, Operation, OperationExt};
use crate::session::{ApiRequest, RequestContext};

impl Papi {
    /// Find property versions by name, hostname or edge hostname
    #[instrument(skip_all, fields(key = %params.key))]
    pub async fn search_properties(
        &self,
        ctx: &RequestContext,
        params: &SearchRequest,
    ) -> ClientResult<SearchResponse> {
        let op = Operation::SearchProperties;
        params.validate().during(op)?;
        debug!("searching for properties");

        let request = ApiRequest::post("/papi/v1/search/find-by-value");
        let response = self.session.exec_with_body(ctx, request, params).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }
}
