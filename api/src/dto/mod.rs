//! Request and response DTOs.

pub mod verification;

pub use verification::{
    RequestCodeRequest, RequestCodeResponse, VerifiedUser, VerifyCodeRequest, VerifyCodeResponse,
};
