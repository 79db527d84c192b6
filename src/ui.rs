use crate::models::{ChecklistResponse, TallyResponse};

pub fn render_index(checklist: &ChecklistResponse, tally: &TallyResponse) -> String {
    let items: String = checklist
        .record
        .items
        .iter()
        .map(|item| {
            format!(
                r#"<li class="{class}"><form method="post" action="/checklist/toggle/{id}"><button type="submit"><span class="icon">{icon}</span><span class="label">{label}</span>{extra}</button></form></li>"#,
                class = if item.completed { "item done" } else { "item" },
                id = escape_html(&item.id),
                icon = escape_html(&item.icon),
                label = escape_html(&item.label),
                extra = item
                    .custom_data
                    .as_ref()
                    .map(|data| format!(
                        r#"<span class="extra">{} {}</span>"#,
                        data.value,
                        escape_html(&data.unit)
                    ))
                    .unwrap_or_default(),
            )
        })
        .collect();

    let zikr_status = if tally.completed {
        "Completed for today".to_string()
    } else {
        format!(
            "{} · {}/{}",
            tally.phase_name, tally.phase_count, tally.phase_target
        )
    };
    let tap_disabled = if tally.completed { "disabled" } else { "" };

    INDEX_HTML
        .replace("{{DATE}}", &checklist.record.date.to_string())
        .replace("{{DONE}}", &checklist.completed_count.to_string())
        .replace("{{TOTAL}}", &checklist.total_count.to_string())
        .replace("{{ITEMS}}", &items)
        .replace("{{ZIKR_STATUS}}", &escape_html(&zikr_status))
        .replace("{{ZIKR_TOTAL}}", &tally.total.to_string())
        .replace("{{TAP_DISABLED}}", tap_disabled)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Ramadhan Companion</title>
  <style>
    :root {
      --bg: #f4f1e8;
      --ink: #1b4332;
      --accent: #d4a017;
      --card: #ffffff;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 24px 16px 40px;
    }

    .app {
      width: min(720px, 100%);
      display: grid;
      gap: 24px;
    }

    section {
      background: var(--card);
      border-radius: 20px;
      padding: 24px;
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .item button {
      width: 100%;
      display: flex;
      gap: 12px;
      align-items: center;
      padding: 12px 16px;
      border: 1px solid #dfe7e2;
      border-radius: 12px;
      background: none;
      font: inherit;
      color: inherit;
      cursor: pointer;
    }

    .item.done button {
      background: #e3f1e8;
      text-decoration: line-through;
    }

    .extra {
      margin-left: auto;
      color: var(--accent);
    }

    .tap {
      width: 100%;
      padding: 28px;
      border: none;
      border-radius: 16px;
      background: var(--ink);
      color: #fff;
      font-size: 1.4rem;
      cursor: pointer;
    }

    .tap:disabled {
      opacity: 0.5;
      cursor: default;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Ramadhan Companion</h1>
      <p>{{DATE}} · {{DONE}} of {{TOTAL}} done</p>
    </header>
    <section>
      <h2>Today's checklist</h2>
      <ul>{{ITEMS}}</ul>
    </section>
    <section>
      <h2>Tasbih</h2>
      <p>{{ZIKR_STATUS}} · total {{ZIKR_TOTAL}}</p>
      <form method="post" action="/zikr/tap">
        <button class="tap" type="submit" {{TAP_DISABLED}}>Tap</button>
      </form>
    </section>
  </main>
</body>
</html>
"#;
