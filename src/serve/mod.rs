//! HTTP server for the interactive walk-through
//!
//! `detecta serve` → starts server, opens browser, drives one [`Flow`]
//!
//! The loop is single-threaded. Before handling each request the flow is
//! advanced by the wall-clock time since the previous one, so timers fire
//! in the gaps between the browser's polls.

pub mod pages;

use crate::config::Settings;
use crate::dashboard;
use crate::error::FlowError;
use crate::flow::{Flow, Route};
use crate::report::{self, html};
use crate::upload::{FileId, FileSpec};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(error: &FlowError) -> Self {
        Self { ok: false, data: None, error: Some(error.to_string()) }
    }
}

/// What to send back: status, content type, body, and an optional download name.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub attachment: Option<String>,
}

impl Reply {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body, attachment: None }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"data":null,"error":"{}"}}"#, e)
        });
        Self { status, content_type: "application/json", body, attachment: None }
    }

    fn ok<T: Serialize>(data: T) -> Self {
        Self::json(200, &ApiResponse::success(data))
    }

    fn error(err: &FlowError) -> Self {
        Self::json(status_for(err), &ApiResponse::failure(err))
    }

    fn not_found(path: &str) -> Self {
        Self { status: 404, ..Self::html(pages::not_found(path)) }
    }
}

fn status_for(err: &FlowError) -> u16 {
    match err {
        FlowError::NoFilesReady | FlowError::InvalidState(_) => 409,
        FlowError::Validation { .. } | FlowError::InvalidOtp(_) => 422,
        FlowError::UnknownFile(_) => 404,
        FlowError::Json(_) => 400,
        _ => 500,
    }
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

#[derive(Deserialize)]
struct OtpBody {
    code: String,
}

#[derive(Serialize)]
struct Redirect {
    redirect: String,
}

#[derive(Serialize)]
struct Finished {
    destination: String,
}

#[derive(Serialize)]
struct SignUpState {
    loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

/// The server's single piece of state.
pub struct App {
    flow: Flow,
    clock: Instant,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flow: Flow::new(
                settings.upload.clone(),
                settings.analyzing.clone(),
                settings.seed,
            ),
            clock: Instant::now(),
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    fn catch_up(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.clock);
        self.clock = now;
        if let Some(route) = self.flow.advance(dt) {
            debug!("Flow moved itself to {}", route);
        }
    }

    /// Show a page, entering its screen unless it is already live.
    fn enter(&mut self, route: Route) -> Result<(), FlowError> {
        if self.flow.route() != &route {
            self.flow.navigate(route)?;
        }
        Ok(())
    }

    pub fn handle(&mut self, method: &Method, url: &str, body: &str) -> Reply {
        self.catch_up();

        let mut parts = url.splitn(2, '?');
        let path = parts.next().unwrap_or("/");
        let query = parts.next().unwrap_or("");

        let result = match (method, path) {
            (Method::Get, "/") => self.page(Route::Home, pages::home),
            (Method::Get, "/upload") => self.page(Route::Upload, pages::upload),
            (Method::Get, "/register") => self.page(Route::Register, pages::register),
            (Method::Get, "/login") => self.page(Route::Login, pages::login),
            (Method::Get, "/change-password") => {
                self.page(Route::ChangePassword, pages::change_password)
            }
            (Method::Get, "/analyzing") => self.analyzing_page(),
            (Method::Get, "/dashboard") => self.enter(Route::Dashboard).map(|_| {
                let q = search_query(query);
                Reply::html(pages::dashboard(&dashboard::view(&q)))
            }),
            (Method::Get, p) if p.starts_with("/analysis/") => return self.report_page(p),

            (Method::Get, "/api/uploads") => self.flow.tracker().map(|t| Reply::ok(t.snapshot())),
            (Method::Post, "/api/uploads") => self.add_uploads(body),
            (Method::Delete, p) if p.starts_with("/api/uploads/") => {
                let id = FileId::from(&p["/api/uploads/".len()..]);
                self.flow
                    .remove(&id)
                    .and_then(|_| self.flow.tracker())
                    .map(|t| Reply::ok(t.snapshot()))
            }
            (Method::Post, "/api/analyze") => self.flow.analyze().map(|route| {
                Reply::ok(Redirect { redirect: route.to_string() })
            }),
            (Method::Get, "/api/analyzing") => self.analyzing_state(),

            (Method::Get, "/api/report") => Ok(Reply::ok(report::sample_report())),
            (Method::Get, p) if p.starts_with("/api/report/") => return self.report_api(p),
            (Method::Get, "/api/dashboard") => Ok(Reply::ok(dashboard::view(&search_query(query)))),

            (Method::Post, "/api/register") => self.register(body),
            (Method::Get, "/api/register") => self.register_state(),

            (Method::Get, "/api/password") => self.flow.password_mut().map(|p| Reply::ok(p.snapshot())),
            (Method::Post, "/api/password/email") => self.password_email(body),
            (Method::Post, "/api/password/otp") => self.password_otp(body),
            (Method::Post, "/api/password/reset") => self.flow.password_mut().map(|p| {
                p.change_email();
                Reply::ok(p.snapshot())
            }),

            (_, p) if p.starts_with("/api/") => {
                return Reply::json(404, &ApiResponse::<()> {
                    ok: false,
                    data: None,
                    error: Some(format!("no endpoint {} {}", method, p)),
                })
            }
            _ => return Reply::not_found(path),
        };

        result.unwrap_or_else(|e| {
            if e.is_notice() {
                info!("{}", e);
            } else {
                warn!("{} {}: {}", method, path, e);
            }
            Reply::error(&e)
        })
    }

    fn page(&mut self, route: Route, render: fn() -> String) -> Result<Reply, FlowError> {
        self.enter(route)?;
        Ok(Reply::html(render()))
    }

    fn analyzing_page(&mut self) -> Result<Reply, FlowError> {
        // Arriving from "Analyze" keeps the running sequencer; a direct visit
        // starts one with no files.
        if self.flow.sequencer().is_err() {
            self.flow.navigate(Route::Analyzing)?;
        }
        let snapshot = self.flow.sequencer()?.snapshot();
        Ok(Reply::html(pages::analyzing(&snapshot)))
    }

    fn analyzing_state(&mut self) -> Result<Reply, FlowError> {
        if let Ok(seq) = self.flow.sequencer() {
            return Ok(Reply::ok(seq.snapshot()));
        }
        match self.flow.route() {
            route @ Route::Analysis { .. } => Ok(Reply::ok(Finished {
                destination: route.to_string(),
            })),
            _ => self.flow.sequencer().map(|s| Reply::ok(s.snapshot())),
        }
    }

    fn report_page(&mut self, path: &str) -> Reply {
        let id = &path["/analysis/".len()..];
        match report::find_report(id) {
            Some(r) => {
                if let Err(e) = self.enter(Route::Analysis { id: r.id.clone() }) {
                    return Reply::error(&e);
                }
                Reply::html(pages::report(&r))
            }
            None => Reply::not_found(path),
        }
    }

    fn report_api(&self, path: &str) -> Reply {
        let rest = &path["/api/report/".len()..];
        let (id, download) = match rest.strip_suffix("/download") {
            Some(id) => (id, true),
            None => (rest, false),
        };
        match report::find_report(id) {
            Some(r) if download => Reply {
                attachment: Some(format!("ai-detection-report-{}.html", r.id)),
                ..Reply::html(html::render_page(&r))
            },
            Some(r) => Reply::ok(r),
            None => Reply::json(404, &ApiResponse::<()> {
                ok: false,
                data: None,
                error: Some(format!("no report {}", id)),
            }),
        }
    }

    fn add_uploads(&mut self, body: &str) -> Result<Reply, FlowError> {
        let files: Vec<FileSpec> = serde_json::from_str(body)?;
        let ids = self.flow.enqueue(files)?;
        debug!("Enqueued {} file(s)", ids.len());
        Ok(Reply::ok(self.flow.tracker()?.snapshot()))
    }

    fn register(&mut self, body: &str) -> Result<Reply, FlowError> {
        let form: crate::auth::RegistrationForm = serde_json::from_str(body)?;
        match self.flow.sign_up_mut()?.submit(&form) {
            Ok(()) => Ok(Reply::ok(SignUpState { loading: true, redirect: None })),
            Err(errors) => Ok(Reply::json(422, &ApiResponse {
                ok: false,
                data: Some(errors),
                error: Some("Please fix the highlighted fields".to_string()),
            })),
        }
    }

    fn register_state(&mut self) -> Result<Reply, FlowError> {
        if self.flow.route() == &Route::Login {
            return Ok(Reply::ok(SignUpState {
                loading: false,
                redirect: Some(Route::Login.to_string()),
            }));
        }
        let loading = self.flow.sign_up_mut()?.is_loading();
        Ok(Reply::ok(SignUpState { loading, redirect: None }))
    }

    fn password_email(&mut self, body: &str) -> Result<Reply, FlowError> {
        let EmailBody { email } = serde_json::from_str(body)?;
        let p = self.flow.password_mut()?;
        p.submit_email(&email)?;
        Ok(Reply::ok(p.snapshot()))
    }

    fn password_otp(&mut self, body: &str) -> Result<Reply, FlowError> {
        let OtpBody { code } = serde_json::from_str(body)?;
        let p = self.flow.password_mut()?;
        p.submit_otp(&code)?;
        Ok(Reply::ok(p.snapshot()))
    }
}

fn search_query(query: &str) -> String {
    serde_urlencoded::from_str::<SearchParams>(query)
        .map(|p| p.q)
        .unwrap_or_default()
}

/// Start server, open browser, serve UI
pub fn start(settings: &Settings) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", settings.serve.port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", settings.serve.port);
    eprintln!("\n\x1b[1;32mdetecta\x1b[0m");
    eprintln!("   {}\n", url);

    if settings.serve.open_browser {
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser: {}", e);
        }
    }

    let mut app = App::new(settings);
    for request in server.incoming_requests() {
        if let Err(e) = respond(request, &mut app) {
            warn!("Error: {}", e);
        }
    }

    Ok(())
}

fn respond(mut request: Request, app: &mut App) -> std::io::Result<()> {
    let method = request.method().clone();
    let url = request.url().to_string();

    let mut body = String::new();
    if matches!(method, Method::Post | Method::Delete) {
        request.as_reader().read_to_string(&mut body)?;
    }

    let reply = app.handle(&method, &url, &body);
    debug!("{} {} -> {}", method, url, reply.status);

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(header);
    }
    if let Some(name) = reply.attachment {
        let value = format!("attachment; filename=\"{}\"", name);
        if let Ok(header) = Header::from_bytes(&b"Content-Disposition"[..], value.as_bytes()) {
            response.add_header(header);
        }
    }
    request.respond(response)
}
