// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use psr_app::ViewMode;

const TITLE: &str = "CKFTA Product Specific Rules";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 1.5rem; color: #222; }
h1 { font-size: 1.4rem; }
#search { width: 22rem; padding: 0.4rem; margin-bottom: 1rem; }
#count { margin-left: 1rem; color: #666; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: 0.35rem 0.5rem; text-align: left; vertical-align: top; }
tbody tr { cursor: pointer; }
tbody tr:hover { background: #eef5ff; }
#modal { display: none; position: fixed; inset: 0; background: rgba(0, 0, 0, 0.45); }
#modal .card { background: #fff; max-width: 48rem; margin: 8vh auto; padding: 1.2rem 1.5rem; border-radius: 6px; }
#modal h3 { margin-bottom: 0.2rem; }
"#;

const TREEMAP_BODY: &str = r#"
<div id="treemap" style="height: 80vh"></div>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<script>
const CHAPTER_HOVER = "<b>Chapter %{label}</b><extra></extra>";
const LEAF_HOVER = "<b>%{label}</b><br>Description: %{customdata[0]}<br>Rule: %{customdata[1]}<extra></extra>";
async function refresh() {
  const q = document.getElementById("search").value;
  const response = await fetch("/api/treemap?q=" + encodeURIComponent(q));
  const data = await response.json();
  document.getElementById("count").textContent =
    data.ids.filter((id) => id.includes("/")).length + " subheadings";
  Plotly.react("treemap", [{
    type: "treemap",
    ids: data.ids,
    labels: data.labels,
    parents: data.parents,
    customdata: data.customdata,
    branchvalues: "remainder",
    hovertemplate: data.parents.map((parent) => (parent === "" ? CHAPTER_HOVER : LEAF_HOVER))
  }], { margin: { t: 10, l: 10, r: 10, b: 10 } });
}
document.getElementById("search").addEventListener("input", refresh);
refresh();
</script>
"#;

const TABLE_BODY: &str = r#"
<table>
  <thead><tr><th>Chapter</th><th>Subheading</th><th>Description</th><th>Rule</th></tr></thead>
  <tbody id="rows"></tbody>
</table>
<div id="modal">
  <div class="card">
    <h2 id="modal-title"></h2>
    <h3>Product Description</h3>
    <p id="modal-description"></p>
    <h3>Product Specific Rule</h3>
    <p id="modal-rule"></p>
    <button id="modal-close">Close</button>
  </div>
</div>
<script>
function cell(text) {
  const td = document.createElement("td");
  td.textContent = text;
  return td;
}
async function openDetail(id) {
  const response = await fetch("/api/rules/" + id);
  if (!response.ok) { return; }
  const detail = await response.json();
  document.getElementById("modal-title").textContent = detail.title;
  document.getElementById("modal-description").textContent = detail.product_description;
  document.getElementById("modal-rule").textContent = detail.product_specific_rule;
  document.getElementById("modal").style.display = "block";
}
function closeDetail() {
  document.getElementById("modal-title").textContent = "";
  document.getElementById("modal-description").textContent = "";
  document.getElementById("modal-rule").textContent = "";
  document.getElementById("modal").style.display = "none";
}
async function refresh() {
  const q = document.getElementById("search").value;
  const response = await fetch("/api/rules?q=" + encodeURIComponent(q));
  const rows = await response.json();
  const body = document.getElementById("rows");
  body.replaceChildren(...rows.map((row) => {
    const tr = document.createElement("tr");
    tr.append(cell(row.chapter), cell(row.subheading), cell(row.short_description), cell(row.short_rule));
    tr.addEventListener("click", () => openDetail(row.id));
    return tr;
  }));
  document.getElementById("count").textContent = rows.length + " rules";
}
document.getElementById("search").addEventListener("input", refresh);
document.getElementById("modal-close").addEventListener("click", closeDetail);
document.addEventListener("keydown", (event) => { if (event.key === "Escape") { closeDetail(); } });
refresh();
</script>
"#;

pub(crate) fn render(variant: ViewMode) -> String {
    let body = match variant {
        ViewMode::Treemap => TREEMAP_BODY,
        ViewMode::Table => TABLE_BODY,
    };
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{TITLE}</h1>\n\
<input id=\"search\" type=\"search\" placeholder=\"Filter by subheading\" autofocus>\
<span id=\"count\"></span>\n{body}</body>\n</html>\n"
    )
}
