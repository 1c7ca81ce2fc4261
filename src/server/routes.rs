use std::fmt;

use tracing::{debug, warn};

use crate::config::Theme;
use crate::server::api::{self, DashboardState};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

pub fn route_request(
    method: &str,
    path: &str,
    body: &str,
    state: &mut DashboardState,
) -> HttpResponse {
    let route = path.split('?').next().unwrap_or(path);
    debug!(method, path, "routing request");
    match (method, route) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/html; charset=utf-8",
            body: index_html(state),
        },
        ("GET", "/api/health") => json_or_500(api::health_payload(state)),
        ("GET", "/api/domains") => json_or_500(api::domains_payload(state)),
        ("GET", "/api/dashboard") => {
            json_or_500(api::dashboard_payload(state, &api::selection_from_query(path)))
        }
        ("POST", "/api/dashboard") => match api::dashboard_post_payload(state, body) {
            Err(api::ApiError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
            result => json_or_500(result),
        },
        ("GET", "/api/summary") => json_or_500(api::summary_payload(state)),
        ("GET", "/api/export") => {
            match api::export_payload(state, &api::selection_from_query(path)) {
                Ok(csv) => HttpResponse {
                    status_code: 200,
                    status_text: "OK",
                    content_type: "text/csv; charset=utf-8",
                    body: csv,
                },
                Err(err) => internal_error(&err),
            }
        }
        ("GET", "/api/geocode/status") => json_or_500(api::geocode_status_payload(state)),
        ("POST", "/api/geocode/populate") => {
            let mode = api::population_mode_from_query(path);
            match api::geocode_populate_payload(state, mode) {
                Err(api::ApiError::GeocoderUnavailable) => error_response(
                    503,
                    "Service Unavailable",
                    "Geocoding is not configured for this server",
                ),
                result => json_or_500(result),
            }
        }
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn json_or_500<E: fmt::Display>(result: Result<String, E>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err) => internal_error(&err),
    }
}

fn internal_error(err: &dyn fmt::Display) -> HttpResponse {
    warn!(error = %err, "request failed");
    error_response(500, "Internal Server Error", &err.to_string())
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

fn index_html(state: &DashboardState) -> String {
    let theme = match state.config.theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    r#"<!doctype html>
<html lang="en" data-theme="__THEME__">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Bairro Restaurant Dashboard</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 960px; margin: 24px auto; padding: 0 12px; }
    html[data-theme="dark"] body { background: #1b1b1b; color: #eee; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    select { width: 100%; min-height: 90px; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Restaurant Dashboard</h1>
  <p>Filters narrow the listing set; every panel is computed from the same selection.</p>

  <div class="card">
    <label for="neighborhood">Neighborhoods</label>
    <select id="neighborhood" multiple></select>
    <label for="rest_type">Restaurant types</label>
    <select id="rest_type" multiple></select>
    <label for="cuisine">Cuisines</label>
    <select id="cuisine" multiple></select>
    <div>
      <button id="dashboard-btn">Apply filters</button>
      <button id="reset-btn">Reset</button>
      <button id="export-btn">Download CSV</button>
    </div>
  </div>

  <div class="card">
    <strong>Map coordinates</strong>
    <div>
      <button id="geo-status-btn">GET /api/geocode/status</button>
      <button id="geo-populate-btn">POST /api/geocode/populate</button>
    </div>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    const fields = ['neighborhood', 'rest_type', 'cuisine'];
    const domainKeys = { neighborhood: 'neighborhoods', rest_type: 'rest_types', cuisine: 'cuisines' };

    function query() {
      const params = new URLSearchParams();
      fields.forEach(f => {
        Array.from(document.getElementById(f).selectedOptions).forEach(o => params.append(f, o.value));
      });
      return params.toString();
    }

    async function request(path, options) {
      output.textContent = 'Loading…';
      const response = await fetch(path, options);
      const text = await response.text();
      output.textContent = 'HTTP ' + response.status + '\n' + text;
    }

    fetch('/api/domains').then(r => r.json()).then(domains => {
      fields.forEach(f => {
        const el = document.getElementById(f);
        (domains[domainKeys[f]] || []).forEach(v => {
          const opt = document.createElement('option');
          opt.value = v; opt.textContent = v; el.appendChild(opt);
        });
      });
    });

    document.getElementById('dashboard-btn').addEventListener('click', () => {
      request('/api/dashboard?' + query(), { method: 'GET' });
    });
    document.getElementById('reset-btn').addEventListener('click', () => {
      fields.forEach(f => Array.from(document.getElementById(f).options).forEach(o => { o.selected = false; }));
      request('/api/dashboard', { method: 'GET' });
    });
    document.getElementById('export-btn').addEventListener('click', () => {
      window.location = '/api/export?' + query();
    });
    document.getElementById('geo-status-btn').addEventListener('click', () => {
      request('/api/geocode/status', { method: 'GET' });
    });
    document.getElementById('geo-populate-btn').addEventListener('click', () => {
      request('/api/geocode/populate', { method: 'POST' });
    });
  </script>
</body>
</html>
"#
    .replace("__THEME__", theme)
}
