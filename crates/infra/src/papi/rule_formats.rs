use propgrid_domain::GetRuleFormatsResponse;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use super::Papi;
use crate::errors::{expect_data, ClientResult, Operation, OperationExt};
use crate::session::{ApiRequest, RequestContext};

impl Papi {
    /// List the rule formats the API accepts
    #[instrument(skip_all)]
    pub async fn get_rule_formats(&self, ctx: &RequestContext) -> ClientResult<GetRuleFormatsResponse> {
        let op = Operation::GetRuleFormats;
        debug!("fetching rule formats");

        let request = ApiRequest::get("/papi/v1/rule-formats");
        let response = self.session.exec(ctx, request).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }
}
