use axum::response::Html;

/// `GET /`: minimal page for pasting a report and reading both explanations.
pub async fn index() -> Html<&'static str> {
    Html(LANDING_PAGE_HTML)
}

const LANDING_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Medical Report Explainer</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 880px; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
  textarea { width: 100%; min-height: 12rem; font: inherit; padding: .5rem; }
  button { margin-top: .75rem; padding: .5rem 1.25rem; font: inherit; cursor: pointer; }
  section { margin-top: 1.5rem; }
  pre { white-space: pre-wrap; background: #f5f7fa; padding: 1rem; border-radius: 6px; }
  .disclaimer { font-size: .85rem; color: #7b8794; }
</style>
</head>
<body>
<h1>Medical Report Explainer</h1>
<p>Paste a radiology or lab report below.</p>
<textarea id="report" placeholder="Chest X-Ray shows mild pleural effusion. No pneumothorax."></textarea>
<button id="analyze">Explain report</button>
<div id="results" hidden>
  <section><h2>For the patient</h2><pre id="patient"></pre></section>
  <section><h2>For the clinician</h2><pre id="clinician"></pre></section>
  <section><h2>References</h2><ul id="citations"></ul></section>
  <p class="disclaimer" id="disclaimer"></p>
</div>
<script>
document.getElementById('analyze').addEventListener('click', async () => {
  const text = document.getElementById('report').value.trim();
  if (!text) { alert('Please paste report text.'); return; }
  const button = document.getElementById('analyze');
  button.disabled = true;
  button.textContent = 'Analyzing...';
  try {
    const res = await fetch('/explain-report', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ report_text: text })
    });
    const data = await res.json();
    if (!res.ok) { throw new Error(data.error ? data.error.message : res.statusText); }
    document.getElementById('patient').textContent = data.patient_explanation;
    document.getElementById('clinician').textContent = data.clinician_explanation;
    const list = document.getElementById('citations');
    list.innerHTML = '';
    for (const url of data.citations) {
      const item = document.createElement('li');
      const link = document.createElement('a');
      link.href = url; link.textContent = url; link.target = '_blank';
      item.appendChild(link);
      list.appendChild(item);
    }
    document.getElementById('disclaimer').textContent = data.disclaimer;
    document.getElementById('results').hidden = false;
  } catch (err) {
    alert('Analysis failed: ' + err.message);
  } finally {
    button.disabled = false;
    button.textContent = 'Explain report';
  }
});
</script>
</body>
</html>
"#;
