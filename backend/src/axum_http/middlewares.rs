use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    axum_http::views::{PageContext, Views},
    usecases::site_configs::SharedSiteConfigs,
};

/// Peer addresses allowed into the admin area. An empty list allows everyone.
#[derive(Debug, Clone)]
pub struct AdminIpAllowList {
    admin_prefix: String,
    allowed_ips: Vec<IpAddr>,
}

impl AdminIpAllowList {
    pub fn new(admin_prefix: &str, allowed_ips: Vec<IpAddr>) -> Self {
        Self {
            admin_prefix: admin_prefix.to_string(),
            allowed_ips,
        }
    }

    fn guards(&self, path: &str) -> bool {
        match path.strip_prefix(self.admin_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    pub fn permits(&self, path: &str, peer: Option<IpAddr>) -> bool {
        if self.allowed_ips.is_empty() || !self.guards(path) {
            return true;
        }
        peer.is_some_and(|ip| self.allowed_ips.contains(&ip.to_canonical()))
    }
}

pub async fn restrict_admin_ips(
    State(allow_list): State<Arc<AdminIpAllowList>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if allow_list.permits(request.uri().path(), peer) {
        return next.run(request).await;
    }

    warn!(
        peer = ?peer,
        path = %request.uri().path(),
        "middleware: admin access from address outside the allow-list"
    );

    let views = request.extensions().get::<Arc<Views>>().cloned();
    let site_configs = request.extensions().get::<SharedSiteConfigs>().cloned();
    match (views, site_configs) {
        (Some(views), Some(site_configs)) => {
            PageContext::load(views, &site_configs, CookieJar::new())
                .await
                .error_page(StatusCode::FORBIDDEN)
        }
        _ => StatusCode::FORBIDDEN.into_response(),
    }
}

const SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
];

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Adds the browser hardening headers; HSTS only when serving production.
pub async fn security_headers(
    State(production): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    if production {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axum_http::views::test_support::with_page_extensions;
    use axum::{
        Router, body::Body, http::Request as HttpRequest, middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    fn allow_list(ips: &[&str]) -> Arc<AdminIpAllowList> {
        Arc::new(AdminIpAllowList::new(
            "/painel",
            ips.iter().map(|ip| ip.parse().unwrap()).collect(),
        ))
    }

    fn guarded_app(allow_list: Arc<AdminIpAllowList>) -> Router {
        let app = Router::new()
            .route("/painel/login", get(|| async { "login" }))
            .route("/plans", get(|| async { "plans" }))
            .layer(from_fn_with_state(allow_list, restrict_admin_ips));
        with_page_extensions(app)
    }

    fn request_from(path: &str, peer: &str) -> Request<Body> {
        let addr: SocketAddr = peer.parse().unwrap();
        HttpRequest::builder()
            .uri(path)
            .extension(ConnectInfo(addr))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn prefix_match_respects_segment_boundary() {
        let list = allow_list(&["10.0.0.1"]);
        assert!(!list.permits("/painel", None));
        assert!(!list.permits("/painel/blog", Some("10.0.0.2".parse().unwrap())));
        assert!(list.permits("/painel-publico", None));
        assert!(list.permits("/painel/blog", Some("10.0.0.1".parse().unwrap())));
    }

    #[test]
    fn ipv4_mapped_peer_matches_plain_entry() {
        let list = allow_list(&["10.0.0.1"]);
        assert!(list.permits("/painel", Some("::ffff:10.0.0.1".parse().unwrap())));
    }

    #[tokio::test]
    async fn unlisted_peer_gets_forbidden_page() {
        let response = guarded_app(allow_list(&["10.0.0.1"]))
            .oneshot(request_from("/painel/login", "192.168.1.50:40000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn listed_peer_and_public_paths_pass() {
        let app = guarded_app(allow_list(&["10.0.0.1"]));

        let admin = app
            .clone()
            .oneshot(request_from("/painel/login", "10.0.0.1:40000"))
            .await
            .unwrap();
        assert_eq!(admin.status(), StatusCode::OK);

        let public = app
            .oneshot(request_from("/plans", "192.168.1.50:40000"))
            .await
            .unwrap();
        assert_eq!(public.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_allow_list_is_open() {
        let response = guarded_app(allow_list(&[]))
            .oneshot(request_from("/painel/login", "192.168.1.50:40000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_are_set_and_hsts_only_in_production() {
        let app = |production: bool| {
            Router::new()
                .route("/", get(|| async { "ok" }))
                .layer(from_fn_with_state(production, security_headers))
        };

        let dev = app(false)
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(dev.headers()[header::X_FRAME_OPTIONS], "SAMEORIGIN");
        assert_eq!(dev.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(dev.headers().get(header::STRICT_TRANSPORT_SECURITY).is_none());

        let prod = app(true)
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(prod.headers()[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    }
}
