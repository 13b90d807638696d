//! Dashboard CSS styles
//!
//! Uses CSS custom properties (variables) for theming.

pub const STYLES: &str = r"
* { box-sizing: border-box; margin: 0; padding: 0; }

:root {
    --bg: #0d1117;
    --card: #161b22;
    --border: #30363d;
    --text: #c9d1d9;
    --text-dim: #8b949e;
    --green: #3fb950;
    --red: #f85149;
    --blue: #58a6ff;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: var(--bg);
    color: var(--text);
    min-height: 100vh;
}

.app { display: flex; min-height: 100vh; }

/* Sidebar */
.sidebar {
    width: 240px;
    flex-shrink: 0;
    padding: 24px 16px;
    background: var(--card);
    border-right: 1px solid var(--border);
}

.brand { font-size: 20px; font-weight: 600; margin-bottom: 16px; }
.who { font-size: 13px; color: var(--text-dim); margin-bottom: 16px; }

.container { flex: 1; max-width: 1000px; margin: 0 auto; padding: 24px; }

h1 { font-size: 24px; font-weight: 600; margin-bottom: 12px; }
h2 { font-size: 18px; font-weight: 600; margin: 16px 0 8px; }
h3 { font-size: 15px; font-weight: 600; margin-bottom: 6px; }

/* Cards */
.card {
    background: var(--card);
    border: 1px solid var(--border);
    border-radius: 12px;
    padding: 20px;
    margin-bottom: 20px;
}

.card.narrow { max-width: 420px; }

/* Forms */
label { display: block; font-size: 13px; color: var(--text-dim); margin: 12px 0 4px; }

input, textarea, select {
    width: 100%;
    padding: 8px 10px;
    border-radius: 6px;
    border: 1px solid var(--border);
    background: var(--bg);
    color: var(--text);
    font-size: 14px;
}

.inline-form { display: flex; align-items: flex-end; gap: 12px; flex-wrap: wrap; }
.inline-form label { width: 100%; }
.inline-form input[type=text] { width: auto; flex: 1; }

/* Buttons */
.btn {
    margin-top: 12px;
    padding: 8px 16px;
    border-radius: 6px;
    border: none;
    font-size: 13px;
    font-weight: 500;
    cursor: pointer;
    transition: all 0.2s;
}

.btn:disabled { opacity: 0.6; cursor: not-allowed; }
.btn-primary { background: var(--blue); color: #fff; }
.btn-primary:hover:not(:disabled) { background: #4c9aed; }
.btn-secondary { background: var(--border); color: var(--text); }
.btn-danger { background: rgba(248, 81, 73, 0.2); color: var(--red); }

/* Notices */
.notice { margin-top: 12px; padding: 10px 12px; border-radius: 6px; font-size: 14px; }
.notice.success { background: rgba(63, 185, 80, 0.15); color: var(--green); }
.notice.error { background: rgba(248, 81, 73, 0.15); color: var(--red); }

.failure {
    margin: 16px 0;
    padding: 16px;
    border-radius: 8px;
    border: 1px solid var(--red);
    color: var(--red);
}

/* Data table */
.table-scroll { max-height: 320px; overflow-y: auto; border: 1px solid var(--border); border-radius: 6px; }
.data-table { width: 100%; border-collapse: collapse; font-size: 13px; }
.data-table th, .data-table td { padding: 6px 10px; text-align: right; border-bottom: 1px solid var(--border); }
.data-table th { position: sticky; top: 0; background: var(--card); color: var(--text-dim); }
.data-table td:first-child, .data-table th:first-child { text-align: left; }

/* Charts */
.chart-card { margin-top: 16px; }
.chart { width: 100%; height: auto; background: var(--bg); border-radius: 8px; }
.chart .plot-area { fill: none; stroke: var(--border); }
.chart .tick, .chart .legend, .chart .axis-label { fill: var(--text-dim); font-size: 12px; }

.metric { display: flex; justify-content: space-between; margin-top: 16px; font-size: 14px; }
.metric-label { color: var(--text-dim); }
.metric-value { font-weight: 600; }

/* Blog feed */
.feed { margin-top: 24px; }
.post {
    background: var(--card);
    border: 1px solid var(--border);
    border-radius: 12px;
    padding: 16px;
    margin-bottom: 16px;
}
.post img { display: block; max-width: 100%; border-radius: 8px; margin: 8px 0; }
.read-more { text-align: center; }
.read-more a { color: var(--blue); }

@media (max-width: 720px) {
    .app { flex-direction: column; }
    .sidebar { width: 100%; border-right: none; border-bottom: 1px solid var(--border); }
}
";
