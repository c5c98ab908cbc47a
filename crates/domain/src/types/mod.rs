//! Domain types shared by the pipeline, the auth layer and the mock backend

pub mod auth;
pub mod request;
pub mod response;

pub use auth::{AuthState, TokenPair};
pub use request::{
    HttpMethod, MultipartBody, MultipartPart, RequestBody, RequestConfig, RequestDescriptor,
    RequestMetadata,
};
pub use response::{Outcome, RawResponse, ResponseEnvelope};
