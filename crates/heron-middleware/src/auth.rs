//! Authentication filters.
//!
//! An [`AuthFilter`] pulls raw credentials out of a request and turns them
//! into a [`Principal`]. Filters run in registration order and the first one
//! to produce a principal wins.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use heron_core::{BoxFuture, Credentials, HeronError, Principal, Request};

/// Where an API key is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyLocation {
    /// A request header.
    Header,
    /// A query parameter.
    Query,
}

impl ApiKeyLocation {
    /// Returns the `in` value used in API documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Query => "query",
        }
    }
}

/// The authentication mechanism a filter implements.
///
/// Two filters with equal schemes document as one security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// An `Authorization` header scheme such as `basic` or `bearer`.
    Http {
        /// Lower-case scheme name.
        scheme: String,
        /// Hint about the token format, e.g. `JWT`.
        bearer_format: Option<String>,
    },
    /// An API key in a header or query parameter.
    ApiKey {
        /// Where the key is carried.
        location: ApiKeyLocation,
        /// Header or parameter name.
        name: String,
    },
}

impl AuthScheme {
    /// HTTP Basic.
    #[must_use]
    pub fn basic() -> Self {
        Self::Http {
            scheme: "basic".to_string(),
            bearer_format: None,
        }
    }

    /// HTTP Bearer.
    #[must_use]
    pub fn bearer() -> Self {
        Self::Http {
            scheme: "bearer".to_string(),
            bearer_format: None,
        }
    }

    /// An API key header.
    #[must_use]
    pub fn api_key_header(name: impl Into<String>) -> Self {
        Self::ApiKey {
            location: ApiKeyLocation::Header,
            name: name.into(),
        }
    }

    /// Returns the security scheme name used in API documents.
    #[must_use]
    pub fn component_name(&self) -> String {
        match self {
            Self::Http { scheme, .. } => format!("{}Auth", scheme.to_ascii_lowercase()),
            Self::ApiKey { name, .. } => name.clone(),
        }
    }

    /// Returns the challenge advertised in `WWW-Authenticate`.
    #[must_use]
    pub fn challenge(&self) -> String {
        match self {
            Self::Http { scheme, .. } => capitalize(scheme),
            Self::ApiKey { location, name } => format!("ApiKey {}=\"{name}\"", location.as_str()),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Extracts and verifies credentials.
pub trait AuthFilter: Send + Sync + 'static {
    /// Returns a non-blank name used in logs.
    fn name(&self) -> &str;

    /// Returns the mechanism this filter implements.
    fn scheme(&self) -> AuthScheme;

    /// Extracts credentials this filter understands.
    ///
    /// The default reads the `Authorization` header for HTTP schemes and the
    /// named header or query parameter for API keys.
    fn extract_credentials(&self, request: &Request) -> Option<Credentials> {
        match self.scheme() {
            AuthScheme::Http { scheme, .. } => request
                .credentials()
                .filter(|credentials| credentials.scheme() == scheme.to_ascii_lowercase()),
            AuthScheme::ApiKey { location, name } => {
                let value = match location {
                    ApiKeyLocation::Header => request.header(&name),
                    ApiKeyLocation::Query => request.query(&name),
                }?;
                Some(Credentials::Other {
                    scheme: "apikey".to_string(),
                    value: value.to_string(),
                })
            }
        }
    }

    /// Verifies credentials.
    ///
    /// `Ok(None)` means the credentials were not accepted and the next
    /// filter should be tried.
    fn authenticate<'a>(
        &'a self,
        credentials: Credentials,
        request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Principal>, HeronError>>;
}

type BasicVerifier =
    Arc<dyn Fn(String, String) -> BoxFuture<'static, Result<Option<Principal>, HeronError>> + Send + Sync>;

/// HTTP Basic authentication backed by a verification closure.
///
/// # Example
///
/// ```rust
/// use heron_core::Principal;
/// use heron_middleware::BasicAuthFilter;
///
/// let filter = BasicAuthFilter::new(|user: String, password: String| async move {
///     Ok((password == "secret").then(|| Principal::new(user)))
/// });
/// ```
#[derive(Clone)]
pub struct BasicAuthFilter {
    verify: BasicVerifier,
}

impl BasicAuthFilter {
    /// Creates a filter from an async `(username, password)` check.
    #[must_use]
    pub fn new<F, Fut>(verify: F) -> Self
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Principal>, HeronError>> + Send + 'static,
    {
        Self {
            verify: Arc::new(
                move |user: String, password: String| -> BoxFuture<'static, Result<Option<Principal>, HeronError>> {
                    Box::pin(verify(user, password))
                },
            ),
        }
    }
}

impl AuthFilter for BasicAuthFilter {
    fn name(&self) -> &str {
        "basic"
    }

    fn scheme(&self) -> AuthScheme {
        AuthScheme::basic()
    }

    fn authenticate<'a>(
        &'a self,
        credentials: Credentials,
        _request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Principal>, HeronError>> {
        match credentials {
            Credentials::Basic { username, password } => (self.verify)(username, password),
            _ => Box::pin(std::future::ready(Ok(None))),
        }
    }
}

impl fmt::Debug for BasicAuthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthFilter").finish_non_exhaustive()
    }
}

type TokenVerifier =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<Option<Principal>, HeronError>> + Send + Sync>;

/// HTTP Bearer authentication backed by a verification closure.
#[derive(Clone)]
pub struct BearerAuthFilter {
    verify: TokenVerifier,
    bearer_format: Option<String>,
}

impl BearerAuthFilter {
    /// Creates a filter from an async token check.
    #[must_use]
    pub fn new<F, Fut>(verify: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Principal>, HeronError>> + Send + 'static,
    {
        Self {
            verify: Arc::new(move |token: String| -> BoxFuture<'static, Result<Option<Principal>, HeronError>> {
                Box::pin(verify(token))
            }),
            bearer_format: None,
        }
    }

    /// Documents the token format, e.g. `JWT`.
    #[must_use]
    pub fn bearer_format(mut self, format: impl Into<String>) -> Self {
        self.bearer_format = Some(format.into());
        self
    }
}

impl AuthFilter for BearerAuthFilter {
    fn name(&self) -> &str {
        "bearer"
    }

    fn scheme(&self) -> AuthScheme {
        AuthScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: self.bearer_format.clone(),
        }
    }

    fn authenticate<'a>(
        &'a self,
        credentials: Credentials,
        _request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Principal>, HeronError>> {
        match credentials {
            Credentials::Bearer(token) => (self.verify)(token),
            _ => Box::pin(std::future::ready(Ok(None))),
        }
    }
}

impl fmt::Debug for BearerAuthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthFilter")
            .field("bearer_format", &self.bearer_format)
            .finish_non_exhaustive()
    }
}

/// API key authentication backed by a verification closure.
#[derive(Clone)]
pub struct ApiKeyAuthFilter {
    verify: TokenVerifier,
    location: ApiKeyLocation,
    name: String,
}

impl ApiKeyAuthFilter {
    /// Creates a filter reading the key from header `name`.
    #[must_use]
    pub fn header<F, Fut>(name: impl Into<String>, verify: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Principal>, HeronError>> + Send + 'static,
    {
        Self {
            verify: Arc::new(move |key: String| -> BoxFuture<'static, Result<Option<Principal>, HeronError>> {
                Box::pin(verify(key))
            }),
            location: ApiKeyLocation::Header,
            name: name.into(),
        }
    }

    /// Creates a filter reading the key from query parameter `name`.
    #[must_use]
    pub fn query<F, Fut>(name: impl Into<String>, verify: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Principal>, HeronError>> + Send + 'static,
    {
        Self {
            location: ApiKeyLocation::Query,
            ..Self::header(name, verify)
        }
    }
}

impl AuthFilter for ApiKeyAuthFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey {
            location: self.location,
            name: self.name.clone(),
        }
    }

    fn authenticate<'a>(
        &'a self,
        credentials: Credentials,
        _request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Principal>, HeronError>> {
        match credentials {
            Credentials::Other { value, .. } => (self.verify)(value),
            _ => Box::pin(std::future::ready(Ok(None))),
        }
    }
}

impl fmt::Debug for ApiKeyAuthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuthFilter")
            .field("location", &self.location)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> BasicAuthFilter {
        BasicAuthFilter::new(|user: String, password: String| async move {
            Ok((password == "secret").then(|| Principal::new(user)))
        })
    }

    #[tokio::test]
    async fn test_basic_filter_accepts_valid_credentials() {
        let request = Request::builder()
            .header("authorization", "Basic YWxpY2U6c2VjcmV0")
            .build();
        let filter = basic();
        let credentials = filter.extract_credentials(&request).unwrap();
        let principal = filter.authenticate(credentials, &request).await.unwrap();
        assert_eq!(principal.unwrap().name(), "alice");
    }

    #[tokio::test]
    async fn test_basic_filter_rejects_wrong_password() {
        // alice:nope
        let request = Request::builder()
            .header("authorization", "Basic YWxpY2U6bm9wZQ==")
            .build();
        let filter = basic();
        let credentials = filter.extract_credentials(&request).unwrap();
        assert!(filter.authenticate(credentials, &request).await.unwrap().is_none());
    }

    #[test]
    fn test_basic_filter_ignores_bearer() {
        let request = Request::builder()
            .header("authorization", "Bearer abc")
            .build();
        assert!(basic().extract_credentials(&request).is_none());
    }

    #[tokio::test]
    async fn test_bearer_filter() {
        let filter = BearerAuthFilter::new(|token: String| async move {
            Ok((token == "t0k3n").then(|| Principal::new("svc")))
        })
        .bearer_format("JWT");
        let request = Request::builder()
            .header("authorization", "Bearer t0k3n")
            .build();
        let credentials = filter.extract_credentials(&request).unwrap();
        assert!(filter.authenticate(credentials, &request).await.unwrap().is_some());
        assert!(matches!(
            filter.scheme(),
            AuthScheme::Http { bearer_format: Some(ref f), .. } if f == "JWT"
        ));
    }

    #[tokio::test]
    async fn test_api_key_filter() {
        let filter = ApiKeyAuthFilter::header("x-api-key", |key: String| async move {
            Ok((key == "k1").then(|| Principal::new("robot")))
        });
        let request = Request::builder().header("X-Api-Key", "k1").build();
        let credentials = filter.extract_credentials(&request).unwrap();
        let principal = filter.authenticate(credentials, &request).await.unwrap();
        assert_eq!(principal.unwrap().name(), "robot");

        let query = ApiKeyAuthFilter::query("key", |_key: String| async move { Ok(None) });
        let request = Request::builder().query("key", "k1").build();
        assert!(query.extract_credentials(&request).is_some());
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!(AuthScheme::basic().component_name(), "basicAuth");
        assert_eq!(AuthScheme::bearer().challenge(), "Bearer");
        assert_eq!(
            AuthScheme::api_key_header("X-Api-Key").component_name(),
            "X-Api-Key"
        );
    }
}
