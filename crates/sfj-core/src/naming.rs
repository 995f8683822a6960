//! Provider-facing names, ARNs, and URLs.
//!
//! These strings are part of the deployed contract: changing any of them
//! breaks idempotency across redeploys.

use crate::hash::FunctionIdentity;

/// Stage every gateway serves from.
pub const DEFAULT_STAGE: &str = "$default";

/// Principal granted invoke permission on deployed functions.
pub const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

pub const INVOKE_ACTION: &str = "lambda:InvokeFunction";

pub fn function_name(prefix: &str, identity: &FunctionIdentity) -> String {
    format!("{prefix}{identity}")
}

/// Recover the identity from a prefixed function name.
pub fn identity_from_function_name(prefix: &str, name: &str) -> Option<FunctionIdentity> {
    name.strip_prefix(prefix)
        .and_then(|rest| FunctionIdentity::parse(rest).ok())
}

pub fn gateway_name(prefix: &str, store_account: &str) -> String {
    format!("{prefix}{store_account}")
}

pub fn role_arn(account_id: &str, role_resource: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_resource}")
}

pub fn function_arn(region: &str, account_id: &str, function_name: &str) -> String {
    format!("arn:aws:lambda:{region}:{account_id}:function:{function_name}")
}

/// Source ARN scoping an invoke grant to every route of one gateway.
pub fn permission_source_arn(region: &str, account_id: &str, gateway_id: &str) -> String {
    format!("arn:aws:execute-api:{region}:{account_id}:{gateway_id}/*/*/*")
}

pub fn gateway_endpoint(gateway_id: &str, region: &str, domain: &str) -> String {
    format!("https://{gateway_id}.execute-api.{region}.{domain}")
}

pub fn function_url(gateway_id: &str, region: &str, domain: &str, path: &str) -> String {
    format!("{}/{path}", gateway_endpoint(gateway_id, region, domain))
}

pub fn route_key(path: &str) -> String {
    format!("ANY /{path}")
}

pub fn integration_target(integration_id: &str) -> String {
    format!("integrations/{integration_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentHasher;

    #[test]
    fn url_shape() {
        assert_eq!(
            function_url("abc123", "us-east-2", "amazonaws.com", "deadbeef"),
            "https://abc123.execute-api.us-east-2.amazonaws.com/deadbeef"
        );
    }

    #[test]
    fn function_name_round_trips_identity() {
        let id = ContentHasher::hash(b"hello");
        let name = function_name("sfj-", &id);
        assert!(name.starts_with("sfj-"));
        assert_eq!(identity_from_function_name("sfj-", &name), Some(id));
        assert_eq!(identity_from_function_name("sfj-", "other-fn"), None);
        assert_eq!(identity_from_function_name("sfj-", "sfj-not-a-hash"), None);
    }

    #[test]
    fn arns() {
        assert_eq!(
            role_arn("123456789012", "service-role/any"),
            "arn:aws:iam::123456789012:role/service-role/any"
        );
        assert_eq!(
            permission_source_arn("us-east-2", "123456789012", "abc123"),
            "arn:aws:execute-api:us-east-2:123456789012:abc123/*/*/*"
        );
        assert_eq!(route_key("deadbeef"), "ANY /deadbeef");
        assert_eq!(integration_target("i1"), "integrations/i1");
    }
}
