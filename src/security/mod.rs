//! # Security Module
//!
//! Evaluation of a route's security requirements against host-supplied callbacks.
//!
//! ## Overview
//!
//! OpenAPI security requirements are an OR of ANDs: a route lists alternative
//! groups, and a group passes when every scheme in it passes. The
//! [`SecurityEvaluator`] walks the groups in declared order and stops at the
//! first group that passes. When none does, the last denial is returned.
//!
//! Each scheme is checked by a [`SecurityCallback`] registered under the
//! scheme's name. Callbacks are async, so a check against a remote backend
//! suspends the request instead of blocking a worker. Every await races the
//! request's [`CancellationToken`](tokio_util::sync::CancellationToken); once
//! the request is aborted the evaluation ends with [`Cancelled`] and any late
//! callback result is dropped. Nothing is retried.
//!
//! ## Callbacks
//!
//! ```rust,ignore
//! use brrtbind::security::{from_fn, Denial, SecurityEvaluator};
//! use std::sync::Arc;
//!
//! let mut evaluator = SecurityEvaluator::new(doc.security_schemes.clone());
//! evaluator.register("bearer", Arc::new(from_fn(|req, _scheme, _scopes| {
//!     match req.get_header("authorization") {
//!         Some(token) if token == "Bearer letmein" => Ok(()),
//!         Some(_) => Err(Denial::forbidden("Token rejected.")),
//!         None => Err(Denial::unauthorized("Missing token.")),
//!     }
//! })));
//! ```
//!
//! [`ApiKeyCallback`] covers static `apiKey` schemes out of the box.

mod api_key;
mod evaluator;

pub use api_key::ApiKeyCallback;
pub use evaluator::{SecurityEvaluator, SecurityOutcome};

use crate::server::RawRequest;
use crate::spec::RouteMeta;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Reason a security check failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    /// 401 or 403
    pub status: u16,
    pub message: String,
    /// Scheme whose callback produced this denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

impl Denial {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: 401,
            message: message.into(),
            scheme: None,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: 403,
            message: message.into(),
            scheme: None,
        }
    }

    fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme.get_or_insert_with(|| scheme.to_string());
        self
    }
}

/// The request was aborted while a security callback was pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request cancelled during security evaluation")]
pub struct Cancelled;

/// What a callback sees of the request.
#[derive(Debug, Clone, Copy)]
pub struct SecurityRequest<'a> {
    pub request: &'a RawRequest,
    pub route: &'a RouteMeta,
}

impl<'a> SecurityRequest<'a> {
    pub fn new(request: &'a RawRequest, route: &'a RouteMeta) -> Self {
        Self { request, route }
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&'a str> {
        self.request.header(name)
    }

    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&'a str> {
        self.request.query_param(name)
    }

    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&'a str> {
        self.request.cookie(name)
    }
}

/// Check of one security scheme, registered under the scheme's name.
#[async_trait]
pub trait SecurityCallback: Send + Sync {
    /// `scheme` is the resolved scheme definition from `securitySchemes`;
    /// `scopes` are the scopes the requirement asks for.
    async fn check(
        &self,
        request: &SecurityRequest<'_>,
        scheme: &Value,
        scopes: &[String],
    ) -> Result<(), Denial>;
}

/// Callback built from a synchronous closure. See [`from_fn`].
pub struct FnCallback<F>(F);

#[async_trait]
impl<F> SecurityCallback for FnCallback<F>
where
    F: Fn(&SecurityRequest<'_>, &Value, &[String]) -> Result<(), Denial> + Send + Sync,
{
    async fn check(
        &self,
        request: &SecurityRequest<'_>,
        scheme: &Value,
        scopes: &[String],
    ) -> Result<(), Denial> {
        (self.0)(request, scheme, scopes)
    }
}

/// Adapt a closure into a [`SecurityCallback`].
pub fn from_fn<F>(f: F) -> FnCallback<F>
where
    F: Fn(&SecurityRequest<'_>, &Value, &[String]) -> Result<(), Denial> + Send + Sync,
{
    FnCallback(f)
}
