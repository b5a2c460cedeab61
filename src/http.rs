use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Duration, Local, NaiveDate, Utc};

use plant_sim::{
    EnergyUnit, KpiSummary, achievement_series, compute_historical_series,
    compute_instant_telemetry, compute_weather, format_energy,
};

use crate::AppState;
use crate::assistant::AssistantError;
use crate::config::{MAX_HISTORY_DAYS, MAX_REFRESH_SECS, MIN_REFRESH_SECS};
use crate::models::{
    AlertFilter, AlertHistoryQuery, AskRequest, AssistantReply, DateRange, ErrorBody,
    HealthResponse, HistoryView, IncomingAlert, SettingsView, TelemetryView,
};
use crate::panels::{MaintenanceRecord, PanelProblem, PanelUpdate};

const DEFAULT_ALERT_HISTORY_DAYS: i64 = 30;

fn error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: msg.into() })).into_response()
}

fn assistant_error(err: AssistantError) -> Response {
    tracing::warn!(error = %err, "assistant call failed");
    match err {
        AssistantError::MissingKey => error(StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        _ => error(StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

fn assistant_disabled() -> Response {
    error(StatusCode::SERVICE_UNAVAILABLE, AssistantError::MissingKey.to_string())
}

pub(crate) async fn ui_home() -> Html<&'static str> {
    // Single HTML page with inline JS calling the REST endpoints.
    // No frontend toolchain required.
    Html(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Solar Monitor</title>
  <style>
    body { font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; margin: 16px; }
    h1 { margin: 0 0 6px 0; }
    .sub { color: #555; margin: 0 0 16px 0; }
    .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
    .card { border: 1px solid #ddd; border-radius: 10px; padding: 12px; }
    .card h2 { font-size: 16px; margin: 0 0 10px 0; }
    .kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 8px; margin-bottom: 12px; }
    .kpi { border: 1px solid #eee; border-radius: 8px; padding: 8px; }
    .kpi .v { font-size: 20px; font-weight: 600; }
    .positive, .up, .high { color: #1a7f37; }
    .neutral, .flat, .medium { color: #9a6700; }
    .negative, .down, .low { color: #cf222e; }
    table { width: 100%; border-collapse: collapse; font-size: 13px; }
    th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; vertical-align: top; }
    th { color: #444; font-weight: 600; background: #fafafa; }
    .row { display: flex; gap: 8px; flex-wrap: wrap; align-items: center; }
    input, select, button, textarea { font-size: 13px; padding: 6px 8px; }
    button { cursor: pointer; }
    .bars { display: flex; align-items: flex-end; gap: 2px; height: 120px; }
    .bar { flex: 1; background: #f2a900; }
    .bar.projected { background: #cfd8e3; }
    .muted { color: #666; }
    .small { font-size: 12px; }
    .turn { margin: 4px 0; white-space: pre-wrap; }
    .turn.user { color: #0b5394; }
  </style>
</head>
<body>
  <h1>Solar Monitor</h1>
  <p class="sub">Simulated production, alerts and panel health. Use the API for automation.</p>

  <div class="row">
    <label>Plant</label>
    <select id="plant"></select>
    <label>From</label><input id="start" type="date" />
    <label>To</label><input id="end" type="date" />
    <button id="reload">Reload</button>
    <span class="small muted" id="updated"></span>
  </div>

  <div class="kpis" id="kpis"></div>

  <div class="grid">
    <div class="card">
      <h2>Today (realized vs projected, kW)</h2>
      <div class="bars" id="curve"></div>
      <div class="small muted" id="curve_meta"></div>
    </div>
    <div class="card">
      <h2>Weather</h2>
      <div id="weather"></div>
    </div>
    <div class="card">
      <h2>History</h2>
      <table><thead><tr><th>Date</th><th>kWh</th><th>Target</th><th>Achieved</th><th>Eff %</th></tr></thead>
      <tbody id="history"></tbody></table>
    </div>
    <div class="card">
      <h2>Components</h2>
      <table><thead><tr><th>Component</th><th>Status</th><th>Last check</th></tr></thead>
      <tbody id="components"></tbody></table>
      <div class="small muted" id="inverters"></div>
    </div>
    <div class="card">
      <h2>Active alerts</h2>
      <table><thead><tr><th>Level</th><th>Title</th><th>Raised</th><th></th></tr></thead>
      <tbody id="alerts"></tbody></table>
    </div>
    <div class="card">
      <h2>Panel assistant</h2>
      <div class="row">
        <select id="panel"><option value="">(no panel)</option></select>
        <button id="analyze">Analyze panel</button>
        <button id="clear">Clear</button>
      </div>
      <div class="row" style="margin-top:6px;">
        <input id="question" style="flex:1" placeholder="Ask about panel health" />
        <button id="ask">Ask</button>
      </div>
      <div id="transcript" class="small"></div>
    </div>
  </div>

  <script>
  const $ = (id) => document.getElementById(id);
  let timer = null;

  async function fetchJson(path, opts) {
    const res = await fetch(path, opts);
    if (!res.ok) {
      const text = await res.text();
      throw new Error(text || res.statusText);
    }
    return res.status === 204 ? null : res.json();
  }

  function kpi(label, value, cls) {
    return `<div class="kpi"><div class="small muted">${label}</div><div class="v ${cls || ''}">${value}</div></div>`;
  }

  async function loadTelemetry(id) {
    const t = await fetchJson(`/plants/${id}/telemetry`);
    const k = t.kpi;
    $('kpis').innerHTML =
      kpi('Current', t.current_production_label + ` (${k.capacity_pct}%)`, k.capacity_band) +
      kpi('Today', t.daily_production_label + ` (${k.target_pct}%)`, k.target_band) +
      kpi('Efficiency', t.telemetry.efficiency_pct + `% (${k.efficiency_delta >= 0 ? '+' : ''}${k.efficiency_delta})`, k.efficiency_trend) +
      kpi('Capacity gauge', k.gauge_pct.toFixed(1) + '%', k.gauge_band);
    const curve = t.telemetry.hourly_curve;
    const max = Math.max(1, ...curve.values);
    $('curve').innerHTML = curve.values.map((v, i) =>
      `<div class="bar ${i > curve.current_hour ? 'projected' : ''}" title="${curve.hours[i]}: ${v} kW" style="height:${100 * v / max}%"></div>`
    ).join('');
    $('curve_meta').textContent = `peak ${t.telemetry.peak_power_kw} kW, average ${t.telemetry.average_power_kw} kW, PR ${t.telemetry.performance_ratio_pct}%`;
    $('components').innerHTML = t.telemetry.component_status.map(c =>
      `<tr><td>${c.component}</td><td>${c.status}</td><td>${c.last_check}</td></tr>`).join('');
    const online = t.telemetry.inverter_status.filter(s => s === 'Online').length;
    $('inverters').textContent = `Inverters online: ${online}/${t.telemetry.inverter_status.length}`;
  }

  async function loadWeather(id) {
    const w = await fetchJson(`/plants/${id}/weather`);
    $('weather').innerHTML = `<div class="v">${w.temperature_c} °C, ${w.condition}</div>
      <div class="small muted">${w.location}: irradiance ${w.irradiance_w_m2} W/m², humidity ${w.humidity_pct}%, wind ${w.wind_speed} km/h</div>`;
  }

  async function loadHistory(id) {
    const q = new URLSearchParams();
    if ($('start').value) q.set('start', $('start').value);
    if ($('end').value) q.set('end', $('end').value);
    const h = await fetchJson(`/plants/${id}/history?${q}`);
    $('history').innerHTML = h.dates.map((d, i) =>
      `<tr><td>${d}</td><td>${h.daily_production[i]}</td><td>${h.daily_target[i]}</td><td>${h.achievement_pct[i].toFixed(1)}%</td><td>${h.efficiency[i]}</td></tr>`).join('');
  }

  async function loadAlerts(id) {
    const rows = await fetchJson(`/alerts?plant_id=${encodeURIComponent(id)}`);
    $('alerts').innerHTML = rows.map(a =>
      `<tr><td>${a.level}</td><td title="${a.message}">${a.title}</td><td>${new Date(a.raised_at).toLocaleString()}</td>
       <td><button data-ack="${a.id}">Ack</button></td></tr>`).join('');
    document.querySelectorAll('[data-ack]').forEach(b => b.addEventListener('click', async () => {
      await fetchJson(`/alerts/${b.dataset.ack}/ack`, { method: 'POST' });
      loadAlerts(id);
    }));
  }

  function renderTranscript(turns) {
    $('transcript').innerHTML = turns.map(t =>
      `<div class="turn ${t.role}"><b>${t.role}:</b> ${t.content.replace(/</g, '&lt;')}</div>`).join('');
  }

  async function assistant(path, body) {
    try {
      const r = await fetchJson(path, { method: 'POST', headers: { 'content-type': 'application/json' }, body: body ? JSON.stringify(body) : undefined });
      renderTranscript(r.transcript);
    } catch (e) {
      $('transcript').textContent = e.message;
    }
  }

  async function refresh() {
    const id = $('plant').value;
    if (!id) return;
    await Promise.all([loadTelemetry(id), loadWeather(id), loadHistory(id), loadAlerts(id)]);
    $('updated').textContent = 'Last updated: ' + new Date().toLocaleTimeString();
  }

  async function init() {
    const [plants, panels, settings] = await Promise.all([
      fetchJson('/plants'), fetchJson('/panels'), fetchJson('/settings'),
    ]);
    $('plant').innerHTML = plants.map(p => `<option value="${p.id}">${p.name} (${p.location})</option>`).join('');
    $('panel').innerHTML += panels.map(p => `<option value="${p.id}">${p.id} ${p.manufacturer} ${p.model}</option>`).join('');
    $('plant').addEventListener('change', refresh);
    $('reload').addEventListener('click', refresh);
    $('ask').addEventListener('click', () => {
      const panel_id = $('panel').value || null;
      assistant('/assistant/ask', { question: $('question').value, panel_id });
    });
    $('analyze').addEventListener('click', () => {
      if ($('panel').value) assistant(`/assistant/analyze/${$('panel').value}`);
    });
    $('clear').addEventListener('click', async () => {
      await fetch('/assistant/transcript', { method: 'DELETE' });
      renderTranscript([]);
    });
    await refresh();
    timer = setInterval(refresh, settings.refresh_secs * 1000);
  }

  init().catch(e => { $('updated').textContent = e.message; });
  </script>
</body>
</html>"#,
    )
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        plants: state.directory.len(),
        assistant: if state.assistant.is_some() {
            "enabled".to_string()
        } else {
            "disabled".to_string()
        },
    })
}

pub(crate) async fn settings(State(state): State<AppState>) -> Json<SettingsView> {
    Json(SettingsView {
        refresh_secs: state.config.refresh_secs,
        min_refresh_secs: MIN_REFRESH_SECS,
        max_refresh_secs: MAX_REFRESH_SECS,
        history_default_days: state.config.history_default_days,
    })
}

pub(crate) async fn list_plants(State(state): State<AppState>) -> Response {
    Json(state.directory.list()).into_response()
}

pub(crate) async fn get_plant(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // Unknown ids get the placeholder profile rather than a 404.
    Json(state.directory.lookup(&id)).into_response()
}

pub(crate) async fn plant_telemetry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let plant = state.directory.lookup(&id);
    // Plant-local wall clock; the sites run on their own daylight.
    let now = Local::now().naive_local();
    let telemetry = compute_instant_telemetry(&plant, now, &mut state.rng());
    let kpi = KpiSummary::from_telemetry(&plant, &telemetry);
    Json(TelemetryView {
        current_production_label: format_energy(
            telemetry.current_production_kw,
            EnergyUnit::Kilowatt,
        ),
        daily_production_label: format_energy(
            telemetry.daily_production_kwh,
            EnergyUnit::KilowattHour,
        ),
        plant,
        telemetry,
        kpi,
    })
    .into_response()
}

pub(crate) async fn plant_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(range): Query<DateRange>,
) -> Response {
    // Parse optional start/end params as YYYY-MM-DD.
    let parse = |raw: &Option<String>| match raw.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some),
        _ => Ok(None),
    };
    let (start, end) = match (parse(&range.start), parse(&range.end)) {
        (Ok(start), Ok(end)) => (start, end),
        _ => return error(StatusCode::BAD_REQUEST, "dates must be YYYY-MM-DD"),
    };

    let window = Duration::days(state.config.history_default_days);
    let today = Local::now().date_naive();
    let bounds = match (start, end) {
        (Some(s), Some(e)) => Some((s, e)),
        (Some(s), None) => Some((s, today)),
        (None, Some(e)) => e.checked_sub_signed(window).map(|s| (s, e)),
        (None, None) => today.checked_sub_signed(window).map(|s| (s, today)),
    };
    let Some((start, end)) = bounds else {
        return error(StatusCode::BAD_REQUEST, "date out of range");
    };
    if end < start {
        return error(StatusCode::BAD_REQUEST, "start must not be after end");
    }
    if (end - start).num_days() > MAX_HISTORY_DAYS {
        return error(
            StatusCode::BAD_REQUEST,
            format!("range must not exceed {MAX_HISTORY_DAYS} days"),
        );
    }

    let plant = state.directory.lookup(&id);
    let series = compute_historical_series(&plant, start, end, &mut state.rng());
    Json(HistoryView {
        plant_id: plant.id,
        start,
        end,
        achievement_pct: achievement_series(&series),
        total_production_kwh: series.total_production(),
        series,
    })
    .into_response()
}

pub(crate) async fn plant_weather(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let plant = state.directory.lookup(&id);
    let now = Local::now().naive_local();
    Json(compute_weather(&plant.location, now, &mut state.rng())).into_response()
}

pub(crate) async fn list_alerts(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Response {
    let alerts = state.alerts.read().await;
    Json(alerts.list_active(filter.plant_id.as_deref(), filter.level)).into_response()
}

pub(crate) async fn alert_history(
    State(state): State<AppState>,
    Query(q): Query<AlertHistoryQuery>,
) -> Response {
    let days = q.days.unwrap_or(DEFAULT_ALERT_HISTORY_DAYS);
    if days < 0 {
        return error(StatusCode::BAD_REQUEST, "days must be >= 0");
    }
    let alerts = state.alerts.read().await;
    Json(alerts.list_history(q.plant_id.as_deref(), days, q.level, Utc::now())).into_response()
}

pub(crate) async fn create_alert(
    State(state): State<AppState>,
    Json(req): Json<IncomingAlert>,
) -> Response {
    if req.plant_id.trim().is_empty() || req.title.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "plant_id and title are required");
    }
    let alert = {
        let mut alerts = state.alerts.write().await;
        alerts.create(req.plant_id, req.level, req.title, req.message, Utc::now())
    };
    tracing::info!(
        alert_id = %alert.id,
        plant_id = %alert.plant_id,
        level = %alert.level,
        "alert created"
    );
    (StatusCode::CREATED, Json(alert)).into_response()
}

pub(crate) async fn ack_alert(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let acked = state.alerts.write().await.acknowledge(&id, Utc::now());
    if acked {
        tracing::info!(alert_id = %id, "alert acknowledged");
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, format!("no active alert {id}"))
    }
}

pub(crate) async fn list_panels(State(state): State<AppState>) -> Response {
    let panels = state.panels.read().await;
    Json(panels.list().to_vec()).into_response()
}

pub(crate) async fn get_panel(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.panels.read().await.get(&id) {
        Some(panel) => Json(panel.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("no panel {id}")),
    }
}

pub(crate) async fn add_maintenance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<MaintenanceRecord>,
) -> Response {
    if state.panels.write().await.add_maintenance(&id, record) {
        StatusCode::CREATED.into_response()
    } else {
        error(StatusCode::NOT_FOUND, format!("no panel {id}"))
    }
}

pub(crate) async fn add_problem(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(problem): Json<PanelProblem>,
) -> Response {
    if state.panels.write().await.add_problem(&id, problem) {
        StatusCode::CREATED.into_response()
    } else {
        error(StatusCode::NOT_FOUND, format!("no panel {id}"))
    }
}

pub(crate) async fn update_panel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<PanelUpdate>,
) -> Response {
    let mut panels = state.panels.write().await;
    if !panels.update(&id, update) {
        return error(StatusCode::NOT_FOUND, format!("no panel {id}"));
    }
    match panels.get(&id) {
        Some(panel) => Json(panel.clone()).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub(crate) async fn ask_assistant(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Response {
    let Some(assistant) = state.assistant.as_ref() else {
        return assistant_disabled();
    };
    if req.question.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "question is required");
    }
    // Copy the panel out so the registry lock is not held during the model call.
    let panel = match req.panel_id.as_deref().filter(|p| !p.is_empty()) {
        Some(panel_id) => match state.panels.read().await.get(panel_id) {
            Some(panel) => Some(panel.clone()),
            None => return error(StatusCode::NOT_FOUND, format!("no panel {panel_id}")),
        },
        None => None,
    };

    let mut assistant = assistant.lock().await;
    match assistant.ask(&req.question, panel.as_ref()).await {
        Ok(reply) => Json(AssistantReply {
            reply,
            transcript: assistant.transcript().to_vec(),
        })
        .into_response(),
        Err(err) => assistant_error(err),
    }
}

pub(crate) async fn analyze_panel(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> Response {
    let Some(assistant) = state.assistant.as_ref() else {
        return assistant_disabled();
    };
    let Some(panel) = state.panels.read().await.get(&panel_id).cloned() else {
        return error(StatusCode::NOT_FOUND, format!("no panel {panel_id}"));
    };

    let mut assistant = assistant.lock().await;
    match assistant.analyze(&panel).await {
        Ok(reply) => Json(AssistantReply {
            reply,
            transcript: assistant.transcript().to_vec(),
        })
        .into_response(),
        Err(err) => assistant_error(err),
    }
}

pub(crate) async fn get_transcript(State(state): State<AppState>) -> Response {
    match state.assistant.as_ref() {
        Some(assistant) => Json(assistant.lock().await.transcript().to_vec()).into_response(),
        None => assistant_disabled(),
    }
}

pub(crate) async fn clear_transcript(State(state): State<AppState>) -> Response {
    match state.assistant.as_ref() {
        Some(assistant) => {
            assistant.lock().await.clear();
            StatusCode::NO_CONTENT.into_response()
        }
        None => assistant_disabled(),
    }
}
