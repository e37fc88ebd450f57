use crate::report::{render_html, render_markdown};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::Submitted { at } => match state.begin_request(at) {
            Some((request_id, request)) => vec![Effect::StartRequest {
                request_id,
                request,
            }],
            None => Vec::new(),
        },
        Msg::CancelRequested => match state.abandon_request() {
            Some(request_id) => vec![Effect::CancelRequest { request_id }],
            None => Vec::new(),
        },
        Msg::TabSelected(tab) => {
            state.select_tab(tab);
            Vec::new()
        }
        Msg::TranslationSelected(index) => {
            state.select_translation(index);
            Vec::new()
        }
        Msg::NewCase => {
            // Late events of the abandoned request are dropped by the request id guard.
            let mut effects = Vec::with_capacity(2);
            if let Some(request_id) = state.abandon_request() {
                effects.push(Effect::CancelRequest { request_id });
            }
            state.reset_case();
            effects.push(Effect::PersistSession(state.snapshot()));
            effects
        }
        Msg::ExportRequested => {
            let markdown = render_markdown(state.artifacts(), state.active_translation());
            let html = render_html(&markdown);
            vec![Effect::ExportReport { markdown, html }]
        }
        Msg::DocumentAdded {
            name,
            kind,
            content,
        } => {
            state.add_document(name, kind, content);
            Vec::new()
        }
        Msg::DocumentContentEdited { id, content } => {
            state.edit_document_content(&id, content);
            Vec::new()
        }
        Msg::DocumentTagsEdited { id, tags } => match state.edit_document_tags(&id, tags) {
            Some((tag_key, tags)) => vec![Effect::SyncTags { tag_key, tags }],
            None => Vec::new(),
        },
        Msg::DocumentRemoved { id } => {
            state.remove_document(&id);
            Vec::new()
        }
        Msg::DocumentSelected(id) => {
            state.select_document(id);
            Vec::new()
        }
        Msg::UploadRequested { path } => {
            let path = path.trim().to_string();
            if path.is_empty() {
                return (state, Vec::new());
            }
            let upload_id = state.register_upload(path.clone());
            vec![Effect::UploadPdf { upload_id, path }]
        }
        Msg::UploadFinished { upload_id, result } => {
            state.complete_upload(upload_id, result);
            Vec::new()
        }
        Msg::RestoreSession(snapshot) => {
            if state.is_busy() {
                return (state, Vec::new());
            }
            state.restore(snapshot);
            Vec::new()
        }
        Msg::StreamOpened { request_id } => {
            state.apply_opened(request_id);
            Vec::new()
        }
        Msg::StreamChunk { request_id, text } => {
            state.apply_chunk(request_id, &text);
            Vec::new()
        }
        Msg::RoutingUpdate { request_id, step } => {
            state.apply_routing_update(request_id, step);
            Vec::new()
        }
        Msg::StreamDone { request_id, at } => {
            if state.apply_done(request_id, at) {
                vec![Effect::PersistSession(state.snapshot())]
            } else {
                Vec::new()
            }
        }
        Msg::StreamError {
            request_id,
            message,
        } => {
            state.apply_failure(request_id, format!("Server error: {message}"));
            Vec::new()
        }
        Msg::RecordRejected { request_id, detail } => {
            state.apply_rejected_record(request_id, detail);
            Vec::new()
        }
        Msg::RequestFailed {
            request_id,
            message,
        } => {
            state.apply_failure(request_id, format!("Request failed: {message}"));
            Vec::new()
        }
        Msg::RequestFinished { request_id } => {
            state.apply_finished(request_id);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
