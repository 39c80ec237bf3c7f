use super::KeyDecryptor;
use crate::error::RuntimeError;
use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use std::collections::HashMap;

/// Decrypts manifest entries through AWS KMS.
pub struct KmsDecryptor {
    client: aws_sdk_kms::Client,
}

impl KmsDecryptor {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_kms::Client::new(config),
        }
    }
}

#[async_trait]
impl KeyDecryptor for KmsDecryptor {
    async fn decrypt(
        &self,
        ciphertext: Vec<u8>,
        context: HashMap<String, String>,
    ) -> Result<Vec<u8>, RuntimeError> {
        let response = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .set_encryption_context(Some(context))
            .send()
            .await
            .map_err(|e| RuntimeError::Decrypt(DisplayErrorContext(&e).to_string()))?;

        response
            .plaintext
            .map(Blob::into_inner)
            .ok_or_else(|| RuntimeError::Decrypt("response contained no plaintext".into()))
    }
}
