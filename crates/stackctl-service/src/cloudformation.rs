//! AWS CloudFormation backend
//!
//! Translates the [`OrchestrationService`] calls into CloudFormation API
//! requests through the AWS SDK. Credentials come from the SDK's default
//! provider chain, optionally narrowed to a named profile.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::config::http::HttpResponse;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::operation::RequestId;
use aws_sdk_cloudformation::types as cfn;
use chrono::{DateTime, Utc};
use tracing::debug;

use stackctl_config::Config;
use stackctl_utils::error::ServiceError;
use stackctl_utils::types::{
    CreateGroupRequest, GroupSummary, LifecycleStatus, Parameter, Resource,
};

use crate::OrchestrationService;

/// CloudFormation returns this code, with a "does not exist" message, when a
/// named stack is unknown.
const VALIDATION_ERROR: &str = "ValidationError";

/// Reported when a stack comes back without a status.
const UNKNOWN_STATUS: &str = "UNKNOWN";

/// CloudFormation-backed service client
#[derive(Clone, Debug)]
pub struct CloudFormationService {
    client: Client,
}

impl CloudFormationService {
    /// Wrap an already configured SDK client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the `[service]` settings.
    ///
    /// Region, profile and endpoint fall back to the SDK's own resolution
    /// (environment, shared config files) when not configured.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.service.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &config.service.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.service.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        debug!(
            region = ?sdk_config.region().map(ToString::to_string),
            "configured CloudFormation client"
        );
        Self::new(Client::new(&sdk_config))
    }
}

/// Map an SDK failure to the service error model.
///
/// Only `ServiceError` responses carry an answer from CloudFormation; every
/// other variant means the request never got a response.
fn map_sdk_error<E>(operation: &str, err: SdkError<E, HttpResponse>) -> ServiceError
where
    E: ProvideErrorMetadata + RequestId + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            let service_err = ctx.err();
            ServiceError::rejected(
                operation,
                service_err
                    .message()
                    .map_or_else(|| service_err.to_string(), ToString::to_string),
                status,
                service_err.code().unwrap_or("Unknown"),
                service_err.request_id().map(ToString::to_string),
            )
        }
        _ => ServiceError::communication(operation, DisplayErrorContext(&err).to_string()),
    }
}

fn is_missing_stack(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::Rejected { error_code, message, .. }
            if error_code == VALIDATION_ERROR && message.contains("does not exist")
    )
}

fn to_utc(time: &aws_sdk_cloudformation::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

fn to_summary(stack: &cfn::Stack) -> GroupSummary {
    GroupSummary {
        name: stack.stack_name().unwrap_or_default().to_string(),
        group_id: stack.stack_id().map(ToString::to_string),
        status: LifecycleStatus::from_service(
            stack
                .stack_status()
                .map_or(UNKNOWN_STATUS, cfn::StackStatus::as_str),
        ),
        status_reason: stack.stack_status_reason().map(ToString::to_string),
        parameters: stack
            .parameters()
            .iter()
            .map(|p| {
                Parameter::new(
                    p.parameter_key().unwrap_or_default(),
                    p.parameter_value().unwrap_or_default(),
                )
            })
            .collect(),
        creation_time: stack.creation_time().and_then(to_utc),
    }
}

fn to_resource(resource: &cfn::StackResource) -> Resource {
    Resource::new(
        resource.resource_type().unwrap_or_default(),
        resource.logical_resource_id().unwrap_or_default(),
        resource.physical_resource_id().map(ToString::to_string),
    )
}

#[async_trait]
impl OrchestrationService for CloudFormationService {
    fn name(&self) -> &'static str {
        "cloudformation"
    }

    async fn create_group(
        &self,
        request: &CreateGroupRequest,
    ) -> Result<Option<String>, ServiceError> {
        let parameters = request
            .parameters
            .iter()
            .map(|p| {
                cfn::Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .build()
            })
            .collect::<Vec<_>>();

        let output = self
            .client
            .create_stack()
            .stack_name(&request.name)
            .template_body(&request.template_body)
            .set_parameters(Some(parameters))
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateStack", e))?;

        Ok(output.stack_id().map(ToString::to_string))
    }

    async fn describe_groups(&self, name: Option<&str>) -> Result<Vec<GroupSummary>, ServiceError> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let result = self
                .client
                .describe_stacks()
                .set_stack_name(name.map(ToString::to_string))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error("DescribeStacks", e));

            let output = match result {
                Ok(output) => output,
                Err(err) if name.is_some() && is_missing_stack(&err) => return Ok(Vec::new()),
                Err(err) => return Err(err),
            };

            groups.extend(output.stacks().iter().map(to_summary));

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(groups)
    }

    async fn list_resources(
        &self,
        group: &str,
        logical_name: Option<&str>,
    ) -> Result<Vec<Resource>, ServiceError> {
        let output = self
            .client
            .describe_stack_resources()
            .stack_name(group)
            .set_logical_resource_id(logical_name.map(ToString::to_string))
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeStackResources", e))?;

        Ok(output.stack_resources().iter().map(to_resource).collect())
    }

    async fn delete_group(&self, name: &str) -> Result<(), ServiceError> {
        self.client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteStack", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackctl_utils::error::ErrorType;
    use stackctl_utils::test_support::{SAMPLE_TEMPLATE, aws_tests_enabled};

    #[test]
    fn test_summary_translation() {
        let stack = cfn::Stack::builder()
            .stack_name("SampleStack")
            .stack_id("arn:aws:cloudformation:us-east-1:123456789012:stack/SampleStack/abc")
            .stack_status(cfn::StackStatus::CreateFailed)
            .stack_status_reason("The following resource(s) failed to create: [SampleQueue]")
            .parameters(
                cfn::Parameter::builder()
                    .parameter_key("KeyName")
                    .parameter_value("test-key")
                    .build(),
            )
            .creation_time(aws_sdk_cloudformation::primitives::DateTime::from_secs(
                1_700_000_000,
            ))
            .build();

        let summary = to_summary(&stack);
        assert_eq!(summary.name, "SampleStack");
        assert_eq!(summary.status, LifecycleStatus::CreateFailed);
        assert_eq!(summary.parameters, vec![Parameter::new("KeyName", "test-key")]);
        assert_eq!(
            summary.creation_time.unwrap().timestamp(),
            1_700_000_000
        );
        assert!(summary.status_reason.unwrap().contains("SampleQueue"));
    }

    #[test]
    fn test_resource_translation_keeps_missing_physical_id() {
        let resource = cfn::StackResource::builder()
            .logical_resource_id("SampleNotificationTopic")
            .resource_type("AWS::SNS::Topic")
            .timestamp(aws_sdk_cloudformation::primitives::DateTime::from_secs(0))
            .resource_status(cfn::ResourceStatus::CreateInProgress)
            .build();

        let translated = to_resource(&resource);
        assert_eq!(translated.resource_type, "AWS::SNS::Topic");
        assert_eq!(translated.logical_name, "SampleNotificationTopic");
        assert_eq!(translated.physical_id, None);
    }

    #[test]
    fn test_sparse_stack_translation_uses_fallbacks() {
        let stack = cfn::Stack::builder().build();

        let summary = to_summary(&stack);
        assert_eq!(summary.name, "");
        assert_eq!(summary.status, LifecycleStatus::Other(UNKNOWN_STATUS.to_string()));
        assert_eq!(summary.creation_time, None);
        assert!(summary.parameters.is_empty());

        let resource = to_resource(&cfn::StackResource::builder().build());
        assert_eq!(resource.resource_type, "");
        assert_eq!(resource.logical_name, "");
    }

    #[test]
    fn test_missing_stack_detection() {
        let missing = ServiceError::rejected(
            "DescribeStacks",
            "Stack with id Nope does not exist",
            400,
            VALIDATION_ERROR,
            None,
        );
        assert!(is_missing_stack(&missing));
        if let ServiceError::Rejected { error_type, .. } = &missing {
            assert_eq!(*error_type, ErrorType::Client);
        }

        let malformed = ServiceError::rejected(
            "CreateStack",
            "Template format error: JSON not well-formed",
            400,
            VALIDATION_ERROR,
            None,
        );
        assert!(!is_missing_stack(&malformed));
    }

    /// Full round trip against a real account; opt in with `STACKCTL_REAL_AWS_TESTS=1`.
    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_real_create_describe_delete() {
        if !aws_tests_enabled() {
            return;
        }
        let config = Config::builder()
            .backend("cloudformation")
            .build()
            .unwrap();
        let service = CloudFormationService::from_config(&config).await;
        let name = format!("stackctl-it-{}", Utc::now().timestamp());

        let request = CreateGroupRequest::new(
            &name,
            SAMPLE_TEMPLATE,
            vec![Parameter::new("KeyName", "test-key")],
        );
        service.create_group(&request).await.unwrap();

        let groups = service.describe_groups(Some(&name)).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].parameters, request.parameters);

        service.delete_group(&name).await.unwrap();
    }
}
