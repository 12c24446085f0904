//! Authentication gateway - scheme dispatch and principal resolution

use super::types::{TrustSource, ValidatedClaims};
use super::validator::TokenValidator;
use crate::error::{Error, Result};
use crate::facility_registry::DirectoryStore;
use crate::user_registry::{Principal, PrincipalRegistry};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

const FACILITY_HEADER: &str = "X-Facility-Id";
const DIRECT_SCHEME: &str = "Bearer";
const MIDDLEWARE_SCHEME: &str = "Middleware_Bearer";

/// The authenticated request identity.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub claims: ValidatedClaims,
}

impl AuthContext {
    pub fn source(&self) -> TrustSource {
        self.claims.source
    }
}

/// Validates the credential on a request and resolves it to a principal.
pub struct AuthGateway {
    validator: TokenValidator,
    directory: Arc<dyn DirectoryStore>,
    principals: Arc<PrincipalRegistry>,
    hcx_username: String,
}

impl AuthGateway {
    pub fn new(
        validator: TokenValidator,
        directory: Arc<dyn DirectoryStore>,
        principals: Arc<PrincipalRegistry>,
        hcx_username: String,
    ) -> Self {
        Self {
            validator,
            directory,
            principals,
            hcx_username,
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Authenticate an operator/device request. Dispatches on the
    /// Authorization scheme: `Bearer` (direct) or `Middleware_Bearer`
    /// (facility middleware). A header that matches neither scheme is
    /// rejected as unauthenticated, not as malformed.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| {
                Error::Unauthorized("Authentication credentials were not provided".to_string())
            })?
            .to_str()
            .map_err(|_| {
                Error::MalformedHeader("Authorization header is not valid ASCII".to_string())
            })?;

        let parts: Vec<&str> = header.split_whitespace().collect();
        match parts.as_slice() {
            [DIRECT_SCHEME, token] => self.authenticate_direct(token).await,
            [MIDDLEWARE_SCHEME, token] => {
                let facility_external_id = headers
                    .get(FACILITY_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        Error::Unauthorized(format!(
                            "{MIDDLEWARE_SCHEME} requires the {FACILITY_HEADER} header"
                        ))
                    })?;
                self.authenticate_middleware(token, facility_external_id)
                    .await
            }
            [scheme, ..] if *scheme == DIRECT_SCHEME || *scheme == MIDDLEWARE_SCHEME => {
                Err(Error::MalformedHeader(
                    "Authorization header must contain two space-delimited values".to_string(),
                ))
            }
            _ => Err(Error::Unauthorized(
                "Unsupported authorization scheme".to_string(),
            )),
        }
    }

    /// Authenticate a health-exchange callback. The exchange glues its own
    /// prefix onto the header, so the whole value goes to the validator.
    pub async fn authenticate_health_exchange(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                Error::Unauthorized("Authentication credentials were not provided".to_string())
            })?;

        let claims = self.validator.validate_health_exchange(header).await?;
        let principal = self
            .principals
            .provision_service_account(&self.hcx_username)
            .await?;

        debug!(principal_id = principal.id, "Exchange request authenticated");
        Ok(AuthContext { principal, claims })
    }

    /// Direct-token authentication for surfaces that carry the token
    /// outside the Authorization header (WebSocket attach).
    pub async fn authenticate_direct(&self, token: &str) -> Result<AuthContext> {
        let claims = self.validator.validate_direct(token)?;

        let subject = claims
            .subject
            .as_deref()
            .ok_or_else(|| Error::invalid_token("Token contains no recognizable user"))?;
        let principal = self
            .principals
            .by_username(subject)
            .await?
            .ok_or_else(|| Error::Unauthorized("User not found".to_string()))?;

        debug!(
            principal_id = principal.id,
            username = %principal.username,
            "Direct request authenticated"
        );
        Ok(AuthContext { principal, claims })
    }

    async fn authenticate_middleware(
        &self,
        token: &str,
        facility_external_id: &str,
    ) -> Result<AuthContext> {
        let facility = self
            .directory
            .facility_by_external_id(facility_external_id)
            .await?
            .ok_or_else(|| Error::invalid_token("Invalid Facility"))?;

        let open_id_url = facility.open_id_url().ok_or_else(|| {
            Error::UntrustedIssuer("Facility not connected to a middleware".to_string())
        })?;

        let claims = self.validator.validate_middleware(token, &open_id_url).await?;

        let asset_external_id = claims
            .asset_id
            .as_deref()
            .ok_or_else(|| Error::invalid_token("Given token does not contain asset_id"))?;
        let asset = self
            .directory
            .asset_by_external_id(asset_external_id)
            .await?
            .ok_or_else(|| Error::invalid_token("Invalid Asset ID"))?;

        if asset.facility_id != facility.id {
            return Err(Error::ScopeMismatch(
                "Facility not connected to Asset".to_string(),
            ));
        }

        let principal = self.principals.provision_for_asset(&asset).await?;

        debug!(
            principal_id = principal.id,
            asset_external_id = %asset.external_id,
            facility_external_id = %facility.external_id,
            "Middleware request authenticated"
        );
        Ok(AuthContext { principal, claims })
    }
}
