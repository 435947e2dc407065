use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use orbitals::config::load_or_default;
use orbitals::physics::{MAX_MODELED_L, MAX_MODELED_N};
use orbitals::{OrbitalBuilder, OrbitalPointCloud, QuantumState, SamplerConfig, Settings, Spin};

const MIN_DRAWS: usize = 100;
const MAX_DRAWS: usize = 500_000;

#[derive(Deserialize)]
struct SampleQuery {
    n: Option<u32>,
    l: Option<u32>,
    m: Option<i32>,
    s: Option<i32>,
    probes: Option<usize>,
    candidates: Option<usize>,
}

#[derive(Serialize)]
struct SampleResponse {
    n: u32,
    l: u32,
    m: i32,
    s: i32,
    label: String,
    modeled: bool,
    count: usize,
    max_radius: f32,
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl From<OrbitalPointCloud> for SampleResponse {
    fn from(cloud: OrbitalPointCloud) -> Self {
        let state = cloud.state;
        SampleResponse {
            n: state.n,
            l: state.l,
            m: state.m,
            s: state.spin.selector(),
            label: state.label(),
            modeled: state.is_modeled(),
            count: cloud.count(),
            max_radius: cloud.max_radius,
            positions: cloud.positions,
            colors: cloud.colors,
        }
    }
}

#[derive(Serialize)]
struct OrbitalInfo {
    label: String,
    n: u32,
    l: u32,
}

const INDEX_HTML: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Hydrogen Orbitals</title>
<style>
  body { margin: 0; background: #000; color: #ccc; font-family: sans-serif; }
  #controls { position: absolute; top: 10px; left: 10px; background: rgba(20,20,20,.85); padding: 10px; }
  label { display: block; margin: 4px 0; }
  canvas { display: block; }
</style>
</head>
<body>
<div id="controls">
  <label>n <input id="n" type="number" min="1" max="4" value="2"></label>
  <label>l <input id="l" type="number" min="0" max="1" value="1"></label>
  <label>m <input id="m" type="number" min="-1" max="1" value="0"></label>
  <label>spin
    <select id="s"><option value="1">up</option><option value="-1">down</option><option value="0">both</option></select>
  </label>
  <div id="status"></div>
</div>
<canvas id="view"></canvas>
<script>
const canvas = document.getElementById('view');
const ctx = canvas.getContext('2d');
const input = id => document.getElementById(id);
let cloud = null, yaw = 0.6, pitch = 0.3, dragging = false;

function clampInputs() {
  const n = Math.max(1, Math.min(4, +input('n').value));
  input('n').value = n;
  input('l').max = n - 1;
  const l = Math.max(0, Math.min(n - 1, +input('l').value));
  input('l').value = l;
  input('m').min = -l; input('m').max = l;
  input('m').value = Math.max(-l, Math.min(l, +input('m').value));
}

async function regenerate() {
  clampInputs();
  const q = ['n', 'l', 'm', 's'].map(k => k + '=' + input(k).value).join('&');
  const res = await fetch('/samples?' + q);
  if (!res.ok) { input('status').textContent = await res.text(); return; }
  cloud = await res.json();
  input('status').textContent = cloud.label + ': ' + cloud.count + ' points';
  draw();
}

function draw() {
  canvas.width = innerWidth; canvas.height = innerHeight;
  ctx.fillStyle = '#000'; ctx.fillRect(0, 0, canvas.width, canvas.height);
  if (!cloud) return;
  const scale = 0.45 * Math.min(canvas.width, canvas.height) / cloud.max_radius;
  const cy = Math.cos(yaw), sy = Math.sin(yaw), cp = Math.cos(pitch), sp = Math.sin(pitch);
  for (let i = 0; i < cloud.count; i++) {
    const [x, y, z] = cloud.positions[i];
    const x1 = x * cy - y * sy, y1 = x * sy + y * cy;
    const y2 = y1 * sp + z * cp;
    const [r, g, b] = cloud.colors[i];
    ctx.fillStyle = `rgba(${r * 255 | 0},${g * 255 | 0},${b * 255 | 0},0.6)`;
    ctx.fillRect(canvas.width / 2 + x1 * scale, canvas.height / 2 - y2 * scale, 1.5, 1.5);
  }
  ctx.fillStyle = '#fff';
  ctx.beginPath(); ctx.arc(canvas.width / 2, canvas.height / 2, 3, 0, 2 * Math.PI); ctx.fill();
}

['n', 'l', 'm', 's'].forEach(k => input(k).addEventListener('change', regenerate));
canvas.addEventListener('mousedown', () => dragging = true);
addEventListener('mouseup', () => dragging = false);
canvas.addEventListener('mousemove', e => {
  if (!dragging) return;
  yaw += e.movementX * 0.01; pitch += e.movementY * 0.01; draw();
});
addEventListener('resize', draw);
regenerate();
</script>
</body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// Resolves a query into a state and sampler settings, rejecting anything
/// the browser controls should never send.
fn resolve_query(
    q: &SampleQuery,
    defaults: &SamplerConfig,
) -> Result<(QuantumState, SamplerConfig), String> {
    let base = QuantumState::default();
    let n = q.n.unwrap_or(base.n);
    let l = q.l.unwrap_or(base.l);
    let m = q.m.unwrap_or(base.m);
    let s = q.s.unwrap_or(base.spin.selector());

    let state = QuantumState::from_input(n, l, m, s)?;

    let config = SamplerConfig {
        probe_samples: q
            .probes
            .unwrap_or(defaults.probe_samples)
            .clamp(MIN_DRAWS, MAX_DRAWS),
        candidate_samples: q
            .candidates
            .unwrap_or(defaults.candidate_samples)
            .clamp(MIN_DRAWS, MAX_DRAWS),
        ..*defaults
    };
    Ok((state, config))
}

async fn samples(
    State(settings): State<Arc<Settings>>,
    Query(q): Query<SampleQuery>,
) -> impl IntoResponse {
    let (state, config) = match resolve_query(&q, &settings.sampler) {
        Ok(resolved) => resolved,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };

    let builder =
        OrbitalBuilder::new(config, settings.palette).with_parallel(settings.parallel);
    match tokio::task::spawn_blocking(move || builder.regenerate(state)).await {
        Ok(cloud) => Json(SampleResponse::from(cloud)).into_response(),
        Err(e) => {
            error!("Sampling task for {} failed: {e}", state.label());
            (StatusCode::INTERNAL_SERVER_ERROR, "sampling failed").into_response()
        }
    }
}

fn modeled_orbitals() -> Vec<OrbitalInfo> {
    (1..=MAX_MODELED_N)
        .flat_map(|n| (0..n.min(MAX_MODELED_L + 1)).map(move |l| (n, l)))
        .map(|(n, l)| OrbitalInfo {
            label: QuantumState { n, l, m: 0, spin: Spin::Up }.label(),
            n,
            l,
        })
        .collect()
}

async fn orbitals() -> impl IntoResponse {
    Json(modeled_orbitals())
}

fn app(settings: Arc<Settings>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/samples", get(samples))
        .route("/orbitals", get(orbitals))
        .with_state(settings)
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt::init();

    let settings_path = std::env::args().nth(1);
    let settings = load_or_default(settings_path.as_deref().map(Path::new)).map_err(|e| {
        error!("Failed to load settings: {e}");
        e
    })?;
    let addr = settings.server.socket_addr()?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {addr}: {e}"))?;
    info!("Serving on http://{addr}");
    axum::serve(listener, app(Arc::new(settings)))
        .await
        .map_err(|e| format!("server: {e}"))
}
