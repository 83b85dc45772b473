use propgrid_common::validation::Validate;
use propgrid_domain::constants::rule_format_media_type;
use propgrid_domain::{
    GetRuleTreeRequest, GetRuleTreeResponse, UpdateRulesRequest, UpdateRulesResponse,
};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use super::Papi;
use crate::errors::{expect_data, ClientResult, Operation, OperationExt};
use crate::session::{ApiRequest, RequestContext};

fn rules_request(
    request: ApiRequest,
    contract_id: &str,
    group_id: &str,
    validate_mode: &str,
    validate_rules: bool,
) -> ApiRequest {
    let mut request = request.query("contractId", contract_id).query("groupId", group_id);
    if !validate_mode.is_empty() {
        request = request.query("validateMode", validate_mode);
    }
    if !validate_rules {
        request = request.query("validateRules", "false");
    }
    request
}

fn rules_path(property_id: &str, version: i32) -> String {
    format!("/papi/v1/properties/{property_id}/versions/{version}/rules")
}

impl Papi {
    /// Fetch the rule tree of a property version
    ///
    /// A non-empty `rule_format` asks the API to render the tree in that
    /// format.
    #[instrument(skip_all, fields(property_id = %params.property_id, version = params.property_version))]
    pub async fn get_rule_tree(
        &self,
        ctx: &RequestContext,
        params: &GetRuleTreeRequest,
    ) -> ClientResult<GetRuleTreeResponse> {
        let op = Operation::GetRuleTree;
        params.validate().during(op)?;
        debug!("fetching rule tree");

        let mut request = rules_request(
            ApiRequest::get(rules_path(&params.property_id, params.property_version)),
            &params.contract_id,
            &params.group_id,
            &params.validate_mode,
            params.validate_rules,
        );
        if !params.rule_format.is_empty() {
            request = request.header(ACCEPT.as_str(), rule_format_media_type(&params.rule_format));
        }

        let response = self.session.exec(ctx, request).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }

    /// Replace the rule tree of a property version
    #[instrument(skip_all, fields(property_id = %params.property_id, version = params.property_version, dry_run = params.dry_run))]
    pub async fn update_rule_tree(
        &self,
        ctx: &RequestContext,
        params: &UpdateRulesRequest,
    ) -> ClientResult<UpdateRulesResponse> {
        let op = Operation::UpdateRuleTree;
        params.validate().during(op)?;
        debug!("updating rule tree");

        let mut request = rules_request(
            ApiRequest::put(rules_path(&params.property_id, params.property_version)),
            &params.contract_id,
            &params.group_id,
            &params.validate_mode,
            params.validate_rules,
        );
        if params.dry_run {
            request = request.query("dryRun", "true");
        }

        let response = self.session.exec_with_body(ctx, request, &params.rules).await.during(op)?;
        expect_data(op, response, StatusCode::OK)
    }
}
