//! Dashboard HTML page handler.
//!
//! Serves a self-contained HTML page with inline CSS/JS. The first paint is
//! rendered from the current document; after that the page polls the JSON
//! API every 3 seconds and re-fetches after each mutation.

use crate::routes::AppState;
use agent_memory_types::{Note, Task};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use std::sync::Arc;

const POLL_INTERVAL_MS: u64 = 3000;

pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let doc = state.store.load();
    let stats = doc.stats();
    let uptime_str = format_uptime(state.start_time.elapsed().as_secs());

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Voice Agent Dashboard</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 20px; }}
  .stats {{ display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }}
  .stat {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px 24px; text-align: center; min-width: 140px; }}
  .stat .val {{ display: block; font-size: 2em; font-weight: bold; color: #58a6ff; }}
  .stat.green .val {{ color: #3fb950; }}
  .stat.yellow .val {{ color: #d29922; }}
  .stat .lbl {{ display: block; font-size: 0.85em; color: #8b949e; margin-top: 4px; }}
  .main {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 24px; }}
  .section {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  .input-group {{ display: flex; gap: 8px; margin-bottom: 12px; }}
  input[type=text] {{ flex: 1; background: #0d1117; border: 1px solid #30363d; color: #e0e0e0; border-radius: 6px; padding: 8px; }}
  button {{ background: #238636; color: #fff; border: none; border-radius: 6px; padding: 6px 12px; cursor: pointer; }}
  button.danger {{ background: #da3633; padding: 2px 8px; }}
  .row {{ display: flex; align-items: center; gap: 8px; padding: 6px 0; border-bottom: 1px solid #21262d; }}
  .row span {{ flex: 1; }}
  .row.completed span {{ text-decoration: line-through; color: #8b949e; }}
  .empty {{ color: #8b949e; font-size: 0.9em; }}
</style>
</head>
<body>
  <h1>Voice Agent Dashboard</h1>
  <p class="meta">Uptime: {uptime_str}</p>

  <div class="stats">
    <div class="stat"><span class="val" id="total-tasks">{total_tasks}</span><span class="lbl">Total Tasks</span></div>
    <div class="stat yellow"><span class="val" id="pending-tasks">{pending_tasks}</span><span class="lbl">Pending</span></div>
    <div class="stat green"><span class="val" id="completed-tasks">{completed_tasks}</span><span class="lbl">Completed</span></div>
    <div class="stat"><span class="val" id="total-notes">{total_notes}</span><span class="lbl">Notes</span></div>
  </div>

  <div class="main">
    <div class="section">
      <h2>Tasks</h2>
      <div class="input-group">
        <input type="text" id="new-task" placeholder="Add a new task...">
        <button onclick="addTask()">Add</button>
      </div>
      <div id="tasks">{task_rows}</div>
    </div>
    <div class="section">
      <h2>Notes</h2>
      <div class="input-group">
        <input type="text" id="new-note" placeholder="Add a new note...">
        <button onclick="addNote()">Add</button>
      </div>
      <div id="notes">{note_rows}</div>
    </div>
  </div>

<script>
const API = '/api';
let tasks = [];

function row(text, extraClass) {{
  const div = document.createElement('div');
  div.className = 'row' + (extraClass ? ' ' + extraClass : '');
  const span = document.createElement('span');
  span.textContent = text;
  div.appendChild(span);
  return div;
}}

function delButton(onClick) {{
  const b = document.createElement('button');
  b.className = 'danger';
  b.textContent = 'x';
  b.onclick = onClick;
  return b;
}}

function renderList(id, items, build, emptyText) {{
  const el = document.getElementById(id);
  el.innerHTML = '';
  if (items.length === 0) {{
    const p = document.createElement('p');
    p.className = 'empty';
    p.textContent = emptyText;
    el.appendChild(p);
    return;
  }}
  items.forEach((item, idx) => el.appendChild(build(item, idx)));
}}

async function fetchData() {{
  try {{
    const [t, n, s] = await Promise.all([
      fetch(API + '/tasks').then(r => r.json()),
      fetch(API + '/notes').then(r => r.json()),
      fetch(API + '/stats').then(r => r.json()),
    ]);
    tasks = t;
    renderList('tasks', t, (task, idx) => {{
      const div = row(task.task, task.done ? 'completed' : '');
      const cb = document.createElement('input');
      cb.type = 'checkbox';
      cb.checked = task.done;
      cb.onchange = () => toggleTask(idx);
      div.prepend(cb);
      div.appendChild(delButton(() => send('DELETE', '/tasks/' + idx)));
      return div;
    }}, 'No tasks yet');
    renderList('notes', n, (note, idx) => {{
      const div = row(note.note);
      div.appendChild(delButton(() => send('DELETE', '/notes/' + idx)));
      return div;
    }}, 'No notes yet');
    document.getElementById('total-tasks').textContent = s.totalTasks;
    document.getElementById('pending-tasks').textContent = s.pendingTasks;
    document.getElementById('completed-tasks').textContent = s.completedTasks;
    document.getElementById('total-notes').textContent = s.totalNotes;
  }} catch (err) {{
    console.error('Error fetching data:', err);
  }}
}}

async function send(method, path, body) {{
  try {{
    const opts = {{ method, headers: {{}} }};
    if (body !== undefined) {{
      opts.headers['Content-Type'] = 'application/json';
      opts.body = JSON.stringify(body);
    }}
    await fetch(API + path, opts);
  }} catch (err) {{
    console.error('Request failed:', err);
  }}
  fetchData();
}}

function toggleTask(idx) {{
  send('PUT', '/tasks/' + idx, {{ done: !tasks[idx].done }});
}}

function addTask() {{
  const input = document.getElementById('new-task');
  if (!input.value.trim()) return;
  send('POST', '/tasks', {{ task: input.value }});
  input.value = '';
}}

function addNote() {{
  const input = document.getElementById('new-note');
  if (!input.value.trim()) return;
  send('POST', '/notes', {{ note: input.value }});
  input.value = '';
}}

document.getElementById('new-task').addEventListener('keydown', e => {{ if (e.key === 'Enter') addTask(); }});
document.getElementById('new-note').addEventListener('keydown', e => {{ if (e.key === 'Enter') addNote(); }});
fetchData();
setInterval(fetchData, {poll_ms});
</script>
</body>
</html>"#,
        uptime_str = uptime_str,
        total_tasks = stats.total_tasks,
        pending_tasks = stats.pending_tasks,
        completed_tasks = stats.completed_tasks,
        total_notes = stats.total_notes,
        task_rows = render_tasks(&doc.tasks),
        note_rows = render_notes(&doc.notes),
        poll_ms = POLL_INTERVAL_MS,
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

fn render_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "<p class=\"empty\">No tasks yet</p>".to_string();
    }
    tasks
        .iter()
        .map(|t| {
            format!(
                "<div class=\"row{}\"><input type=\"checkbox\" disabled{}><span>{}</span></div>\n",
                if t.done { " completed" } else { "" },
                if t.done { " checked" } else { "" },
                escape_html(&t.text),
            )
        })
        .collect()
}

fn render_notes(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "<p class=\"empty\">No notes yet</p>".to_string();
    }
    notes
        .iter()
        .map(|n| format!("<div class=\"row\"><span>{}</span></div>\n", escape_html(&n.text)))
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_uptime(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s:02}s"),
        _ => format!("{h}h {m:02}m {s:02}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use agent_memory_types::Document;
    use axum::response::IntoResponse;
    use std::time::Instant;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"milk\" & 'eggs'</b>"),
            "&lt;b&gt;&quot;milk&quot; &amp; &#39;eggs&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 05s");
        assert_eq!(format_uptime(3725), "1h 02m 05s");
    }

    #[tokio::test]
    async fn test_dashboard_renders_current_document() {
        let mut doc = Document::default();
        let mut done = Task::new("<script>", "t");
        done.done = true;
        doc.push_task(done);
        doc.push_note(Note::new("remember this", "t"));

        let state = Arc::new(AppState {
            store: Arc::new(InMemoryStore::new(doc)),
            port: 5000,
            start_time: Instant::now(),
        });
        let response = dashboard(State(state)).await.into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("row completed"));
        assert!(body.contains("remember this"));
        assert!(body.contains("setInterval(fetchData, 3000)"));
        assert!(body.contains(r#"id="completed-tasks">1<"#));
    }
}
