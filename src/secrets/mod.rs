//! Build-time secret baking.
//!
//! 1. **Normalize**: parse `environmentSecrets` into `{name, path}` references
//! 2. **Resolve**: fetch each parameter's ciphertext from the parameter store
//! 3. **Write**: bake the ciphertexts into `secret-baker-secrets.json`
//!
//! The manifest only exists while the deployment artifact is being packaged.

pub mod normalize;
pub mod resolver;
pub mod ssm;
pub mod store;
pub mod types;

pub use normalize::{normalize, SecretConfig};
pub use resolver::SecretResolver;
pub use ssm::SsmRequester;
pub use store::{CachedRequester, ParameterRequest};
pub use types::{
    GetParameterOutput, GetParameterRequest, Parameter, RequestOptions, ResolvedSecret,
    SecretManifest, SecretReference, StoreFailure, SECRETS_FILE,
};
