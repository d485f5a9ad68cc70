use std::sync::Arc;

use anyhow::Result;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Datelike, Utc};
use crates::domain::value_objects::site_configs::SiteConfigMap;
use tera::{Context, Tera};
use tracing::error;

use crate::{
    axum_http::flash::{self, FlashMessage},
    usecases::site_configs::SharedSiteConfigs,
};

/// Server-side templates, embedded in the binary.
pub struct Views {
    tera: Tera,
    admin_prefix: String,
}

impl Views {
    pub fn new(admin_prefix: &str) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("base.html", include_str!("../../templates/base.html")),
            ("index.html", include_str!("../../templates/index.html")),
            ("plans.html", include_str!("../../templates/plans.html")),
            ("blog.html", include_str!("../../templates/blog.html")),
            ("speed_test.html", include_str!("../../templates/speed_test.html")),
            ("about.html", include_str!("../../templates/about.html")),
            ("error.html", include_str!("../../templates/error.html")),
            (
                "admin/base.html",
                include_str!("../../templates/admin/base.html"),
            ),
            (
                "admin/login.html",
                include_str!("../../templates/admin/login.html"),
            ),
            (
                "admin/posts.html",
                include_str!("../../templates/admin/posts.html"),
            ),
            (
                "admin/post_form.html",
                include_str!("../../templates/admin/post_form.html"),
            ),
            (
                "admin/plans.html",
                include_str!("../../templates/admin/plans.html"),
            ),
            (
                "admin/plan_form.html",
                include_str!("../../templates/admin/plan_form.html"),
            ),
            (
                "admin/settings.html",
                include_str!("../../templates/admin/settings.html"),
            ),
        ])?;

        Ok(Self {
            tera,
            admin_prefix: admin_prefix.to_string(),
        })
    }

    pub fn admin_prefix(&self) -> &str {
        &self.admin_prefix
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

fn error_title(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "Page not found",
        StatusCode::FORBIDDEN => "Access denied",
        _ => "Something went wrong",
    }
}

/// Everything a page handler needs to render: the templates, the current
/// site configuration and the pending flash messages.
pub struct PageContext {
    views: Arc<Views>,
    site: SiteConfigMap,
    jar: CookieJar,
    flashes: Vec<FlashMessage>,
}

impl PageContext {
    pub async fn load(
        views: Arc<Views>,
        site_configs: &SharedSiteConfigs,
        jar: CookieJar,
    ) -> Self {
        let site = site_configs.all_values().await;
        let (jar, flashes) = flash::take(jar);
        Self {
            views,
            site,
            jar,
            flashes,
        }
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("flashes", &self.flashes);
        context.insert("admin_prefix", self.views.admin_prefix());
        context.insert("current_year", &Utc::now().year());
        context
    }

    pub fn render(self, template_name: &str, context: Context) -> Response {
        self.render_with_status(StatusCode::OK, template_name, context)
    }

    pub fn render_with_status(
        self,
        status: StatusCode,
        template_name: &str,
        context: Context,
    ) -> Response {
        let mut full_context = self.base_context();
        full_context.extend(context);

        match self.views.render(template_name, &full_context) {
            Ok(html) => (status, self.jar, Html(html)).into_response(),
            Err(err) => {
                error!(template = template_name, error = ?err, "views: failed to render template");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }

    /// Shared 404/403/500 page.
    pub fn error_page(self, status: StatusCode) -> Response {
        let mut context = Context::new();
        context.insert("status", &status.as_u16());
        context.insert("title", error_title(status));
        self.render_with_status(status, "error.html", context)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let views = parts.extensions.get::<Arc<Views>>().cloned();
        let site_configs = parts.extensions.get::<SharedSiteConfigs>().cloned();
        let (Some(views), Some(site_configs)) = (views, site_configs) else {
            error!("views: page context extensions are missing");
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        };

        let jar = CookieJar::from_headers(&parts.headers);
        Ok(PageContext::load(views, &site_configs, jar).await)
    }
}
