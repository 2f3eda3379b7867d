//! HTTP front end: one freshly generated map per `GET /`.

use anyhow::{Context, anyhow};
use minijinja::{Environment, context};
use rand::{SeedableRng, rngs::StdRng};
use std::{io::Cursor, sync::Arc, time::Instant};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::{Generator, Result, Settings};

const TEMPLATE_NAME: &str = "index.html";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/index.html");

/// What a request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// `GET /`: a freshly generated map page.
    Map,
    /// Any other path.
    NotFound,
    /// Anything but `GET`.
    MethodNotAllowed,
}

impl Route {
    /// Routes on method and path; the query string is ignored.
    #[must_use]
    pub fn resolve(method: &Method, url: &str) -> Self {
        let path = url.split('?').next().unwrap_or_default();
        match (method, path) {
            (Method::Get, "/") => Self::Map,
            (Method::Get, _) => Self::NotFound,
            _ => Self::MethodNotAllowed,
        }
    }
}

/// Renders generated maps into the HTML page.
///
/// Read-only once built, so one instance serves every request.
pub struct Page {
    env: Environment<'static>,
    generator: Generator,
    width: usize,
    height: usize,
    content_type: Header,
}

impl Page {
    /// Builds the page from `settings`, loading the template file if one is set.
    ///
    /// # Errors
    ///
    /// Fails if the template cannot be read or does not parse.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let mut env = Environment::new();
        match &settings.template {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read template '{}'", path.display()))?;
                env.add_template_owned(TEMPLATE_NAME, source)
                    .with_context(|| format!("Invalid template '{}'", path.display()))?;
            }
            None => env
                .add_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)
                .context("Invalid built-in template")?,
        }
        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..])
            .map_err(|()| anyhow!("Invalid content type header"))?;

        Ok(Self {
            env,
            generator: Generator::from_settings(settings),
            width: settings.width,
            height: settings.height,
            content_type,
        })
    }

    /// Generates a map from `seed` and renders it into HTML.
    ///
    /// # Errors
    ///
    /// Generation failures and [`crate::MapError::Template`].
    pub fn render(&self, seed: u64) -> Result<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = self.generator.generate(&mut rng)?;
        let html = self.env.get_template(TEMPLATE_NAME)?.render(context! {
            map => grid.to_string(),
            width => self.width,
            height => self.height,
            seed => seed,
        })?;
        Ok(html)
    }

    fn respond(&self, seed: u64) -> Response<Cursor<Vec<u8>>> {
        let start = Instant::now();
        match self.render(seed) {
            Ok(html) => {
                tracing::info!(seed, elapsed = ?start.elapsed(), "served map");
                Response::from_string(html).with_header(self.content_type.clone())
            }
            Err(err) => {
                tracing::error!(seed, "{err}");
                Response::from_string(err.to_string()).with_status_code(500)
            }
        }
    }
}

/// Serves `GET /` on `settings.address` until the listener closes.
///
/// Each request generates on its own grid and random source, on the rayon pool.
///
/// # Errors
///
/// Fails if the page cannot be built or the address cannot be bound.
pub fn serve(settings: &Settings) -> anyhow::Result<()> {
    let page = Arc::new(Page::new(settings)?);
    let server = Server::http(&settings.address)
        .map_err(|e| anyhow!("Failed to bind {}: {e}", settings.address))?;
    tracing::info!(address = %settings.address, "listening");

    for request in server.incoming_requests() {
        let page = Arc::clone(&page);
        rayon::spawn(move || handle(request, &page));
    }
    Ok(())
}

fn handle(request: Request, page: &Page) {
    let route = Route::resolve(request.method(), request.url());
    tracing::debug!(method = %request.method(), url = request.url(), ?route, "request");

    if let Err(err) = request.respond(response_for(route, page)) {
        tracing::warn!("Failed to send response: {err}");
    }
}

fn response_for(route: Route, page: &Page) -> Response<Cursor<Vec<u8>>> {
    match route {
        Route::Map => page.respond(rand::random()),
        Route::NotFound => Response::from_string("Not found").with_status_code(404),
        Route::MethodNotAllowed => {
            Response::from_string("Method not allowed").with_status_code(405)
        }
    }
}
