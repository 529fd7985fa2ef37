//! HTML rendering with Handlebars. Message text comes from users and
//! the model so it must stay escaped; nothing here registers a helper
//! that would bypass that.

use std::fmt;

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

use super::{Frame, ViewModel};

#[derive(Debug)]
pub enum Template {
    Index,
    Transcript,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const TRANSCRIPT_TEMPLATE: &str = r#"<div class="transcript">
{{#each messages}}
  <div class="message {{sender}}" data-id="{{id}}">{{text}}</div>
{{/each}}
{{#if error}}
  <div class="message error" role="alert"><span class="icon">!</span> <span>{{error}}</span></div>
{{/if}}
{{#if typing}}
  <div class="message ai typing"><span class="spinner"></span> <span>Typing...</span></div>
{{/if}}
  <div id="transcript-end"></div>
</div>
"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{title}}</title>
  <style>
    body { font-family: sans-serif; max-width: 42rem; margin: 0 auto; padding: 1rem; }
    #scroll { height: calc(100vh - 250px); overflow-y: auto; border: 1px solid #ddd; border-radius: 6px; }
    .transcript { display: flex; flex-direction: column; gap: 1rem; padding: 1rem; }
    .message { padding: 0.75rem; border-radius: 0.75rem; white-space: pre-wrap; }
    .message.user { background: #dbeafe; align-self: flex-end; }
    .message.ai { background: #f3f4f6; align-self: flex-start; }
    .message.error { background: #fee2e2; color: #991b1b; align-self: flex-start; }
    .controls { display: flex; flex-direction: column; gap: 0.5rem; margin-top: 1rem; }
    .composer { display: flex; gap: 0.5rem; }
    .composer input { flex: 1; }
  </style>
</head>
<body>
  <h1>{{title}}</h1>
  <div id="scroll"><div id="transcript-container"></div></div>
  <div class="controls">
    <button id="upload" type="button" disabled>Upload PDF</button>
    <input id="file" type="file" accept="application/pdf" hidden>
    <div class="composer">
      <input id="input" placeholder="Ask something..." autocomplete="off">
      <button id="send" type="button" disabled>Send</button>
    </div>
  </div>
  <script>
    let sessionId = null;

    function apply(frame) {
      document.getElementById("transcript-container").innerHTML = frame.html;
      const upload = document.getElementById("upload");
      upload.disabled = !frame.view.upload_enabled;
      upload.textContent = frame.view.upload_label;
      document.getElementById("send").disabled = !frame.view.send_enabled;
      if (frame.scroll_to_latest) {
        const scroll = document.getElementById("scroll");
        scroll.scrollTop = scroll.scrollHeight;
      }
    }

    function post(path, body) {
      return fetch(`/api/sessions/${sessionId}/${path}`, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
      });
    }

    function send() {
      // Enter bypasses the button, keep the text while a reply is pending
      if (document.getElementById("send").disabled) return;
      const input = document.getElementById("input");
      const message = input.value;
      if (!message.trim()) return;
      input.value = "";
      post("messages", { message });
    }

    function uploadFile(file) {
      const reader = new FileReader();
      reader.onload = () => post("upload", { file_name: file.name, mime_type: file.type, data: reader.result });
      reader.onerror = () => post("upload", { file_name: file.name, mime_type: file.type, data: null });
      if (file.type === "application/pdf") {
        reader.readAsDataURL(file);
      } else {
        post("upload", { file_name: file.name, mime_type: file.type, data: null });
      }
    }

    async function start() {
      const resp = await fetch("/api/sessions", { method: "POST" });
      const body = await resp.json();
      sessionId = body.session_id;
      const events = new EventSource(`/api/sessions/${sessionId}/events`);
      events.addEventListener("view", (e) => apply(JSON.parse(e.data)));

      const fileInput = document.getElementById("file");
      document.getElementById("upload").onclick = () => fileInput.click();
      fileInput.onchange = () => {
        if (fileInput.files.length > 0) uploadFile(fileInput.files[0]);
        fileInput.value = "";
      };
      document.getElementById("send").onclick = send;
      document.getElementById("input").addEventListener("keydown", (e) => {
        if (e.key === "Enter") send();
      });
    }

    start();
  </script>
</body>
</html>
"#;

pub const PAGE_TITLE: &str = "PDF-Powered Chatbot";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry
        .register_template_string(&Template::Transcript.to_string(), TRANSCRIPT_TEMPLATE)
        .expect("Failed to register template");
    registry
        .register_template_string(&Template::Index.to_string(), INDEX_TEMPLATE)
        .expect("Failed to register template");
    registry
}

pub fn render_transcript(registry: &Handlebars, view: &ViewModel) -> Result<String> {
    Ok(registry.render(&Template::Transcript.to_string(), view)?)
}

pub fn render_index(registry: &Handlebars) -> Result<String> {
    Ok(registry.render(&Template::Index.to_string(), &json!({ "title": PAGE_TITLE }))?)
}

/// A frame with its transcript HTML, as pushed to browsers.
pub fn render_frame(registry: &Handlebars, frame: &Frame) -> Result<serde_json::Value> {
    let html = render_transcript(registry, &frame.view)?;
    Ok(json!({
        "view": frame.view,
        "scroll_to_latest": frame.scroll_to_latest,
        "html": html,
    }))
}
