use axum::extract::{FromRequest, FromRequestParts};

use crate::error::HandlerError;

/// JSON body extractor whose rejections become validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HandlerError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections become validation errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HandlerError))]
pub struct ApiPath<T>(pub T);
