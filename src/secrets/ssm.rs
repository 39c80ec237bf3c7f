//! AWS SSM Parameter Store request capability.

use super::store::ParameterRequest;
use super::types::{
    GetParameterOutput, GetParameterRequest, Parameter, RequestOptions, StoreFailure,
    NOT_FOUND_STATUS,
};
use crate::config::AwsSettings;
use async_trait::async_trait;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use tokio::sync::OnceCell;
use tracing::debug;

/// Issues `GetParameter` through the AWS SDK.
///
/// The SDK client carries credentials, region, retries and timeouts; this
/// type only translates between the SDK and [`ParameterRequest`].
pub struct SsmRequester {
    client: OnceCell<aws_sdk_ssm::Client>,
    settings: AwsSettings,
}

impl SsmRequester {
    /// Requester that resolves AWS configuration on its first request, so
    /// runs that never fetch a parameter never touch the credential chain.
    pub fn lazy(settings: AwsSettings) -> Self {
        Self {
            client: OnceCell::new(),
            settings,
        }
    }

    pub fn from_client(client: aws_sdk_ssm::Client) -> Self {
        Self {
            client: OnceCell::from(client),
            settings: AwsSettings::default(),
        }
    }

    async fn client(&self) -> &aws_sdk_ssm::Client {
        self.client
            .get_or_init(|| async {
                debug!("Loading AWS configuration for ssm");
                aws_sdk_ssm::Client::new(&self.settings.load().await)
            })
            .await
    }
}

#[async_trait]
impl ParameterRequest for SsmRequester {
    fn name(&self) -> &str {
        "ssm"
    }

    async fn get_parameter(
        &self,
        request: &GetParameterRequest,
        _options: RequestOptions,
    ) -> Result<GetParameterOutput, StoreFailure> {
        debug!(
            "{}.{} '{}' (decrypt: {})",
            request.service(),
            request.operation(),
            request.name,
            request.with_decryption
        );

        let response = self
            .client()
            .await
            .get_parameter()
            .name(&request.name)
            .with_decryption(request.with_decryption)
            .send()
            .await
            .map_err(|err| {
                // No raw response means the request never got an answer
                // (dispatch failure, timeout); report status 0.
                let raw_status = err
                    .raw_response()
                    .map(|raw| raw.status().as_u16())
                    .unwrap_or(0);
                let service_error = err.as_service_error();

                let status_code = match service_error {
                    Some(GetParameterError::ParameterNotFound(_)) => NOT_FOUND_STATUS,
                    _ => raw_status,
                };
                let message = service_error
                    .and_then(|e| e.message())
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

                StoreFailure::new(status_code, message)
            })?;

        let parameter = response.parameter.and_then(|p| match (p.value, p.arn) {
            (Some(value), Some(arn)) => Some(Parameter { value, arn }),
            _ => None,
        });

        Ok(GetParameterOutput { parameter })
    }
}
