//! Server-rendered pages for the web UI
//!
//! Pages are thin: the screens with timers (upload, analyzing, password
//! change, sign-up) poll the JSON API and draw whatever the server-side
//! state machine reports.

use crate::analyzing::SequencerSnapshot;
use crate::auth::register::PASSWORD_REQUIREMENTS;
use crate::auth::OTP_LENGTH;
use crate::dashboard::DashboardView;
use crate::landing;
use crate::report::html::{escape, render_body, STYLE};
use crate::report::{severity, AnalysisReport};
use crate::upload::file::{ACCEPTED_EXTENSIONS, MAX_FILE_SIZE};
use std::fmt::Write as _;

pub fn layout(title: &str, body: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - detecta</title>
    <style>{style}</style>
</head>
<body>
    <nav>
        <a class="brand" href="/">detecta</a>
        <a href="/upload">Upload</a>
        <a href="/dashboard">Dashboard</a>
        <a href="/register">Sign up</a>
    </nav>
    <div class="container">
{body}
    </div>
    <script>
    async function api(method, url, body) {{
        const res = await fetch(url, {{
            method,
            headers: {{ 'Content-Type': 'application/json' }},
            body: body === undefined ? undefined : JSON.stringify(body),
        }});
        return res.json();
    }}
    function esc(value) {{
        const div = document.createElement('div');
        div.textContent = value == null ? '' : String(value);
        return div.innerHTML;
    }}
{script}
    </script>
</body>
</html>
"#,
        title = escape(title),
        style = STYLE,
        body = body,
        script = script,
    )
}

pub fn home() -> String {
    let mut body = format!(
        r#"<div class="card" style="text-align:center; padding: 4rem 2rem;">
            <h1>{}</h1>
            <p class="subtitle">{}</p>
            <p style="margin-top: 1.5rem;"><a href="/register"><button>Get Started Free</button></a>
            <a href="/analysis/1" style="margin-left: 1rem;">See Demo</a></p>
        </div>
        <div class="grid">"#,
        escape(landing::HEADLINE),
        escape(landing::TAGLINE),
    );

    for stat in landing::STATS {
        let _ = write!(
            body,
            r#"<div class="card stat"><div class="stat-value">{}</div><div class="stat-label">{}</div></div>"#,
            stat.display(),
            stat.label
        );
    }
    body.push_str("</div><h2>Features</h2><div class=\"grid\">");
    for f in landing::FEATURES {
        let _ = write!(
            body,
            r#"<div class="card"><strong>{}</strong><p class="dim">{}</p></div>"#,
            f.title, f.description
        );
    }
    body.push_str("</div><h2>How It Works</h2><div class=\"grid\">");
    for (i, step) in landing::HOW_IT_WORKS.iter().enumerate() {
        let _ = write!(
            body,
            r#"<div class="card"><div class="stat-value">{}</div><strong>{}</strong><p class="dim">{}</p></div>"#,
            i + 1,
            step.title,
            step.description
        );
    }
    let _ = write!(
        body,
        r#"</div><div class="card" style="text-align:center;"><h1>{}</h1>
        <p><a href="/upload"><button>Upload a Document</button></a></p></div>"#,
        landing::CALL_TO_ACTION
    );

    layout("Home", &body, "")
}

pub fn upload() -> String {
    let accept: Vec<String> = ACCEPTED_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect();
    let body = format!(
        r#"<h1>Upload Documents</h1>
        <p class="subtitle">Upload PDF or DOCX files to analyze for AI-generated content</p>
        <div class="card">
            <h2>Select Files</h2>
            <p class="dim">Drag and drop or click to browse. Max {max_mb}MB per file.</p>
            <input type="file" id="file-input" accept="{accept}" multiple>
            <div id="notice" class="notice" style="margin-top:1rem;"></div>
            <div id="files" style="margin-top:1rem;"></div>
            <p style="margin-top:1rem;"><span id="summary" class="dim"></span>
            <button id="analyze" disabled>Analyze</button></p>
        </div>"#,
        max_mb = MAX_FILE_SIZE / (1024 * 1024),
        accept = accept.join(","),
    );

    let script = r#"
    const input = document.getElementById('file-input');
    input.addEventListener('change', async () => {
        const files = Array.from(input.files).map(f => ({ name: f.name, type: f.type, size: f.size }));
        input.value = '';
        draw(await api('POST', '/api/uploads', files));
    });

    document.getElementById('analyze').addEventListener('click', async () => {
        const res = await api('POST', '/api/analyze');
        if (res.ok) {
            window.location = res.data.redirect;
        } else {
            const notice = document.getElementById('notice');
            notice.textContent = res.error;
            notice.style.display = 'block';
            setTimeout(() => notice.style.display = 'none', 3000);
        }
    });

    async function removeFile(id) {
        draw(await api('DELETE', '/api/uploads/' + id));
    }

    function draw(res) {
        if (!res.ok) return;
        const snap = res.data;
        const list = document.getElementById('files');
        list.innerHTML = snap.files.map(f => `
            <div class="step ${f.status === 'error' ? 'pending' : f.status === 'complete' ? 'complete' : 'processing'}">
                <div>
                    <strong>${esc(f.file.name)}</strong>
                    <span class="dim">${(f.file.size / (1024 * 1024)).toFixed(2)} MB</span>
                    ${f.status === 'uploading' ? `<div class="bar"><div class="bar-fill" style="width:${f.progress}%"></div></div>` : ''}
                    ${f.error ? `<div class="error">${esc(f.error)}</div>` : ''}
                </div>
                <div>
                    ${f.status === 'uploading' ? Math.round(f.progress) + '%' : f.status === 'complete' ? '&#10003;' : ''}
                    <button onclick="removeFile('${esc(f.id)}')">&times;</button>
                </div>
            </div>`).join('');
        document.getElementById('summary').textContent = snap.total ? snap.summary : '';
        const button = document.getElementById('analyze');
        button.disabled = snap.ready === 0;
        button.textContent = snap.ready > 0 ? `Analyze (${snap.ready})` : 'Analyze';
    }

    setInterval(async () => draw(await api('GET', '/api/uploads')), 200);
    "#;

    layout("Upload", &body, script)
}

pub fn analyzing(snapshot: &SequencerSnapshot) -> String {
    let body = format!(
        r#"<div class="card" style="text-align:center;">
            <h1 id="headline">{headline}</h1>
            <p class="subtitle" id="phase">{phase}</p>
            <div class="bar"><div class="bar-fill" id="progress" style="width:{progress}%"></div></div>
            <p class="dim"><span id="percent">{progress}</span>% complete</p>
        </div>
        <div class="card" id="steps"></div>
        <div class="grid" id="metrics"></div>
        <p class="dim" style="text-align:center;">This usually takes about 30 seconds depending on file size</p>"#,
        headline = escape(&snapshot.headline),
        phase = escape(&snapshot.phase),
        progress = snapshot.progress,
    );

    let script = r#"
    async function poll() {
        const res = await api('GET', '/api/analyzing');
        if (!res.ok) return;
        const s = res.data;
        if (s.destination) {
            window.location = s.destination;
            return;
        }
        document.getElementById('headline').textContent = s.headline;
        document.getElementById('phase').textContent = s.phase;
        document.getElementById('progress').style.width = s.progress + '%';
        document.getElementById('percent').textContent = s.progress;
        document.getElementById('steps').innerHTML = s.steps.map(step => `
            <div class="step ${step.status}">
                <div><strong>${esc(step.label)}</strong><div class="dim">${esc(step.sublabel)}</div></div>
                <div>${step.status === 'complete' ? '&#10003;' : step.status === 'processing' ? 'In progress...' : ''}</div>
            </div>`).join('');
        document.getElementById('metrics').innerHTML = s.metrics.map(m => `
            <div class="card stat"><div class="stat-value">${m.value.toLocaleString()}</div>
            <div class="stat-label">${esc(m.label)}</div></div>`).join('');
    }
    poll();
    setInterval(poll, 200);
    "#;

    layout("Analyzing", &body, script)
}

pub fn report(report: &AnalysisReport) -> String {
    let body = format!(
        r#"<p><a href="/dashboard">&larr; Back to dashboard</a> &middot;
        <a href="/api/report/{id}/download">Download Report</a></p>
        {content}"#,
        id = escape(&report.id),
        content = render_body(report),
    );
    layout("Analysis Report", &body, "")
}

pub fn dashboard(view: &DashboardView) -> String {
    let mut body = String::from(
        r#"<h1>Dashboard</h1>
        <p class="subtitle">Manage and review your document analyses</p>
        <p><a href="/upload"><button>Upload New</button></a></p>
        <div class="grid">"#,
    );
    for (label, value) in [
        ("Total Documents", view.stats.total),
        ("Completed", view.stats.completed),
        ("Processing", view.stats.processing),
        ("High Risk", view.stats.high_risk),
    ] {
        let _ = write!(
            body,
            r#"<div class="card stat"><div class="stat-value">{}</div><div class="stat-label">{}</div></div>"#,
            value, label
        );
    }

    let _ = write!(
        body,
        r#"</div><div class="card"><h2>Recent Documents</h2>
        <form method="get" action="/dashboard"><input name="q" placeholder="Search documents..." value="{}"></form>
        <table><tr><th>Name</th><th>Status</th><th>Text</th><th>Images</th><th>Uploaded</th><th>Pages</th></tr>"#,
        escape(&view.query)
    );

    for doc in &view.documents {
        let _ = write!(
            body,
            r#"<tr><td><a href="/analysis/{id}">{name}</a></td><td>{status}</td>
            <td class="score {text_class}">{text}%</td><td class="score {image_class}">{image}%</td>
            <td>{date}</td><td>{pages} pages, {images} images</td></tr>"#,
            id = escape(&doc.id),
            name = escape(&doc.name),
            status = doc.status,
            text_class = severity(doc.text_score).css_class(),
            text = doc.text_score,
            image_class = severity(doc.image_score).css_class(),
            image = doc.image_score,
            date = doc.upload_date.format("%Y-%m-%d"),
            pages = doc.pages,
            images = doc.images,
        );
    }
    if view.documents.is_empty() {
        body.push_str(r#"<tr><td colspan="6" class="dim">No documents match your search.</td></tr>"#);
    }
    body.push_str("</table></div>");

    layout("Dashboard", &body, "")
}

pub fn register() -> String {
    let mut requirements = String::new();
    for r in PASSWORD_REQUIREMENTS {
        let _ = write!(requirements, "<li>{}</li>", r.label);
    }

    let body = format!(
        r#"<div class="card" style="max-width: 480px; margin: 0 auto;">
            <h1>Create an account</h1>
            <p class="subtitle">Start detecting AI-generated content today</p>
            <form id="form">
                <p><input name="name" placeholder="Full name"></p><p class="error" id="err-name"></p>
                <p><input name="email" placeholder="you@example.com"></p><p class="error" id="err-email"></p>
                <p><input name="password" type="password" placeholder="Password"></p><p class="error" id="err-password"></p>
                <ul class="dim">{requirements}</ul>
                <p><input name="confirmPassword" type="password" placeholder="Confirm password"></p><p class="error" id="err-confirmPassword"></p>
                <p><button id="submit">Create Account</button></p>
            </form>
            <p class="dim"><a href="/change-password">Forgot your password?</a></p>
        </div>"#
    );

    let script = r#"
    document.getElementById('form').addEventListener('submit', async (e) => {
        e.preventDefault();
        const data = Object.fromEntries(new FormData(e.target));
        const res = await api('POST', '/api/register', data);
        for (const field of ['name', 'email', 'password', 'confirmPassword']) {
            document.getElementById('err-' + field).textContent = (res.data && res.data[field]) || '';
        }
        if (res.ok) {
            const button = document.getElementById('submit');
            button.disabled = true;
            button.textContent = 'Creating account...';
            const timer = setInterval(async () => {
                const state = await api('GET', '/api/register');
                if (state.ok && state.data.redirect) {
                    clearInterval(timer);
                    window.location = state.data.redirect;
                }
            }, 200);
        }
    });
    "#;

    layout("Register", &body, script)
}

pub fn login() -> String {
    let body = r#"<div class="card" style="max-width: 480px; margin: 0 auto;">
            <h1>Welcome back</h1>
            <p class="subtitle">Your account is ready. Sign-in is not part of this walk-through.</p>
            <p><a href="/upload"><button>Continue to upload</button></a></p>
            <p class="dim"><a href="/change-password">Change password</a></p>
        </div>"#;
    layout("Login", body, "")
}

pub fn change_password() -> String {
    let body = format!(
        r##"<div class="card" style="max-width: 480px; margin: 0 auto;">
            <h1>Change Password</h1>
            <p class="subtitle" id="description"></p>
            <div id="step-email">
                <p><input id="email" placeholder="you@example.com"></p>
                <p><button id="proceed">Proceed</button></p>
            </div>
            <div id="step-verifying" style="display:none;"><p class="dim">Verifying email securely&hellip;</p></div>
            <div id="step-otp" style="display:none;">
                <p><input id="otp" maxlength="{otp_len}" placeholder="{placeholder}"></p>
                <p class="error" id="otp-error"></p>
                <p><button id="verify">Verify OTP</button> <a href="#" id="change">Change email</a></p>
            </div>
            <div id="step-done" style="display:none;"><p>Verified. You can now set a new password.</p></div>
        </div>"##,
        otp_len = OTP_LENGTH,
        placeholder = "0".repeat(OTP_LENGTH),
    );

    let script = r#"
    function show(state) {
        for (const step of ['email', 'verifying', 'otp', 'done']) {
            document.getElementById('step-' + step).style.display = state.step === step ? 'block' : 'none';
        }
        document.getElementById('description').textContent = state.description;
    }
    async function refresh() {
        const res = await api('GET', '/api/password');
        if (res.ok) show(res.data);
    }
    document.getElementById('proceed').addEventListener('click', async () => {
        const res = await api('POST', '/api/password/email', { email: document.getElementById('email').value });
        if (res.ok) show(res.data);
    });
    document.getElementById('verify').addEventListener('click', async () => {
        const res = await api('POST', '/api/password/otp', { code: document.getElementById('otp').value });
        document.getElementById('otp-error').textContent = res.ok ? '' : res.error;
        if (res.ok) show(res.data);
    });
    document.getElementById('change').addEventListener('click', async (e) => {
        e.preventDefault();
        const res = await api('POST', '/api/password/reset');
        if (res.ok) show(res.data);
    });
    refresh();
    setInterval(refresh, 500);
    "#;

    layout("Change Password", &body, script)
}

pub fn not_found(path: &str) -> String {
    let body = format!(
        r#"<div class="card" style="text-align:center;"><h1>404</h1><p class="dim">No page at {}</p>
        <p><a href="/">Return to Home</a></p></div>"#,
        escape(path)
    );
    layout("Not Found", &body, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard;
    use crate::report::sample_report;

    #[test]
    fn test_layout_escapes_title() {
        let html = layout("<x>", "", "");
        assert!(html.contains("<title>&lt;x&gt; - detecta</title>"));
    }

    #[test]
    fn test_change_password_page_keeps_every_step() {
        let html = change_password();
        assert!(html.contains(r##"<a href="#" id="change">Change email</a>"##));
        assert!(html.contains(r#"id="step-done""#));
        assert!(html.contains(r#"maxlength="6""#));
    }

    #[test]
    fn test_client_side_values_are_escaped() {
        let html = upload();
        assert!(html.contains("function esc(value)"));
        assert!(html.contains("${esc(f.file.name)}"));
        assert!(html.contains("${esc(f.error)}"));
        assert!(!html.contains("<strong>${f.file.name}</strong>"));

        let page = analyzing(&crate::analyzing::PhaseSequencer::start(
            vec![],
            Default::default(),
            rand::rngs::mock::StepRng::new(0, 1),
        )
        .unwrap()
        .snapshot());
        assert!(page.contains("${esc(step.label)}"));
        assert!(page.contains("${esc(m.label)}"));
    }

    #[test]
    fn test_upload_page_accepts_pdf_and_docx() {
        let html = upload();
        assert!(html.contains(r#"accept=".pdf,.docx""#));
        assert!(html.contains("Max 50MB per file"));
    }

    #[test]
    fn test_dashboard_lists_filtered_documents() {
        let html = dashboard(&dashboard::view("blog"));
        assert!(html.contains("Blog_Article_Draft.docx"));
        assert!(!html.contains("Marketing_Report.docx"));
        assert!(html.contains(r#"value="blog""#));
    }

    #[test]
    fn test_dashboard_empty_search() {
        let html = dashboard(&dashboard::view("zzz"));
        assert!(html.contains("No documents match your search."));
    }

    #[test]
    fn test_report_page_links_download() {
        let html = report(&sample_report());
        assert!(html.contains("/api/report/1/download"));
        assert!(html.contains("Key Findings"));
    }

    #[test]
    fn test_home_has_stats() {
        let html = home();
        assert!(html.contains("500K+"));
        assert!(html.contains("Privacy First"));
    }
}
