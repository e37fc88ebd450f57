use workbench_core::{
    update, AppState, ChatMessage, Document, Effect, Msg, Role, SessionSnapshot, UploadReceipt,
};

fn add_document(state: AppState, name: &str, content: &str) -> AppState {
    update(
        state,
        Msg::DocumentAdded {
            name: name.to_string(),
            kind: "TXT".to_string(),
            content: content.to_string(),
        },
    )
    .0
}

#[test]
fn added_documents_get_ids_and_page_estimates() {
    let state = add_document(AppState::new(), "annual report", &"a".repeat(7000));
    let state = add_document(state, "term sheet", "short");

    let docs = state.documents();
    assert_eq!(docs[0].id, "doc-1");
    assert_eq!(docs[0].pages, 3);
    assert_eq!(docs[1].id, "doc-2");
    assert_eq!(docs[1].pages, 1);
}

#[test]
fn editing_content_recomputes_pages() {
    let state = add_document(AppState::new(), "notes", "short");
    let (state, _) = update(
        state,
        Msg::DocumentContentEdited {
            id: "doc-1".to_string(),
            content: "b".repeat(9001),
        },
    );
    assert_eq!(state.documents()[0].pages, 4);
}

#[test]
fn tags_are_normalized_on_edit() {
    let state = add_document(AppState::new(), "notes", "x");
    let (state, _) = update(
        state,
        Msg::DocumentTagsEdited {
            id: "doc-1".to_string(),
            tags: vec!["loan ".to_string(), " ".to_string(), "loan".to_string()],
        },
    );
    assert_eq!(state.documents()[0].tags, vec!["loan"]);
}

#[test]
fn local_documents_keep_tags_locally() {
    let state = add_document(AppState::new(), "notes", "x");
    let (_, effects) = update(
        state,
        Msg::DocumentTagsEdited {
            id: "doc-1".to_string(),
            tags: vec!["loan".to_string()],
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn uploaded_document_tags_are_synced_by_content_key() {
    let (state, _) = update(
        AppState::new(),
        Msg::UploadRequested {
            path: "facility.pdf".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            upload_id: 1,
            result: Ok(UploadReceipt {
                id: Some("srv-7".to_string()),
                pages: Some(3),
                tag_key: Some("662d150c".to_string()),
            }),
        },
    );

    let (state, effects) = update(
        state,
        Msg::DocumentTagsEdited {
            id: "srv-7".to_string(),
            tags: vec![" covenant".to_string(), "covenant".to_string(), "2024".to_string()],
        },
    );
    assert_eq!(state.documents()[0].tags, vec!["covenant", "2024"]);
    assert_eq!(
        effects,
        vec![Effect::SyncTags {
            tag_key: "662d150c".to_string(),
            tags: vec!["covenant".to_string(), "2024".to_string()],
        }]
    );
}

#[test]
fn removing_selected_document_clears_selection() {
    let state = add_document(AppState::new(), "notes", "x");
    let (state, _) = update(state, Msg::DocumentSelected(Some("doc-1".to_string())));
    assert_eq!(state.view().selected_document.as_deref(), Some("doc-1"));

    let (state, _) = update(
        state,
        Msg::DocumentRemoved {
            id: "doc-1".to_string(),
        },
    );
    assert!(state.documents().is_empty());
    assert_eq!(state.view().selected_document, None);
}

#[test]
fn selecting_unknown_document_is_ignored() {
    let state = add_document(AppState::new(), "notes", "x");
    let (state, _) = update(state, Msg::DocumentSelected(Some("doc-9".to_string())));
    assert_eq!(state.view().selected_document, None);
}

#[test]
fn request_carries_documents_and_system_context() {
    let state = add_document(AppState::new(), "annual report", "revenue grew");
    let (state, _) = update(state, Msg::DocumentSelected(Some("doc-1".to_string())));
    let (state, _) = update(state, Msg::InputChanged("summarize it".to_string()));
    let (_state, effects) = update(
        state,
        Msg::Submitted {
            at: "t".to_string(),
        },
    );

    let Some(Effect::StartRequest { request, .. }) = effects.first() else {
        panic!("expected start effect, got {effects:?}");
    };
    assert!(request.stream);
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].content, "summarize it");
    assert_eq!(request.documents.len(), 1);
    assert_eq!(request.system_context.selected_doc_id.as_deref(), Some("doc-1"));
    assert_eq!(
        request.system_context.selected_doc_name.as_deref(),
        Some("annual report")
    );
    assert!(!request.system_context.has_summary);

    let body = serde_json::to_value(request).unwrap();
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["documents"][0]["type"], "TXT");
    assert_eq!(body["stream"], true);
}

#[test]
fn upload_round_trip_adds_pdf_document() {
    let (state, effects) = update(
        AppState::new(),
        Msg::UploadRequested {
            path: "/tmp/filings/q3-report.pdf".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UploadPdf {
            upload_id: 1,
            path: "/tmp/filings/q3-report.pdf".to_string(),
        }]
    );
    assert_eq!(state.view().pending_uploads, 1);

    let (state, _) = update(
        state,
        Msg::UploadFinished {
            upload_id: 1,
            result: Ok(UploadReceipt {
                id: Some("srv-42".to_string()),
                pages: Some(12),
                tag_key: Some("abc".to_string()),
            }),
        },
    );

    let doc = &state.documents()[0];
    assert_eq!(doc.id, "srv-42");
    assert_eq!(doc.name, "q3-report");
    assert_eq!(doc.kind, "PDF");
    assert_eq!(doc.pages, 12);
    assert_eq!(doc.tag_key.as_deref(), Some("abc"));
    assert_eq!(state.view().pending_uploads, 0);
}

#[test]
fn failed_upload_sets_error() {
    let (state, _) = update(
        AppState::new(),
        Msg::UploadRequested {
            path: "scan.pdf".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            upload_id: 1,
            result: Err("http status 413".to_string()),
        },
    );
    assert!(state.documents().is_empty());
    assert_eq!(
        state.view().error.as_deref(),
        Some("Upload failed: http status 413")
    );
}

fn request_upload(state: AppState, path: &str) -> AppState {
    update(
        state,
        Msg::UploadRequested {
            path: path.to_string(),
        },
    )
    .0
}

fn finish_upload(state: AppState, upload_id: u64, result: Result<UploadReceipt, String>) -> AppState {
    update(state, Msg::UploadFinished { upload_id, result }).0
}

fn receipt(id: &str) -> Result<UploadReceipt, String> {
    Ok(UploadReceipt {
        id: Some(id.to_string()),
        pages: Some(2),
        tag_key: Some("k".to_string()),
    })
}

#[test]
fn new_upload_clears_previous_upload_error() {
    let state = request_upload(AppState::new(), "scan.pdf");
    let state = finish_upload(state, 1, Err("http status 500".to_string()));
    assert!(state.view().error.is_some());

    let state = request_upload(state, "scan-fixed.pdf");
    assert_eq!(state.view().error, None);
    let state = finish_upload(state, 2, receipt("srv-1"));

    assert_eq!(state.view().error, None);
    assert_eq!(state.documents().len(), 1);
}

#[test]
fn successful_upload_clears_error_of_concurrent_failure() {
    let state = request_upload(AppState::new(), "a.pdf");
    let state = request_upload(state, "b.pdf");
    let state = finish_upload(state, 1, Err("http status 500".to_string()));
    assert_eq!(
        state.view().error.as_deref(),
        Some("Upload failed: http status 500")
    );

    let state = finish_upload(state, 2, receipt("srv-2"));
    assert_eq!(state.view().error, None);
    assert_eq!(state.documents()[0].name, "b");
}

#[test]
fn restored_session_continues_message_ids() {
    let snapshot = SessionSnapshot {
        messages: vec![ChatMessage {
            id: 7,
            role: Role::User,
            name: "You".to_string(),
            time: "t0".to_string(),
            content: "earlier".to_string(),
            bullets: Vec::new(),
            attachment: None,
        }],
        artifacts: Default::default(),
        documents: vec![Document::new("doc-1", "kept", "TXT", "text")],
    };
    let (state, _) = update(AppState::new(), Msg::RestoreSession(snapshot.clone()));
    assert_eq!(state.snapshot(), snapshot);

    let (state, _) = update(state, Msg::InputChanged("again".to_string()));
    let (state, _) = update(
        state,
        Msg::Submitted {
            at: "t1".to_string(),
        },
    );
    assert_eq!(state.messages()[1].id, 8);

    // Local ids must not collide with restored documents.
    let (state, _) = update(
        state,
        Msg::DocumentAdded {
            name: "new".to_string(),
            kind: "TXT".to_string(),
            content: String::new(),
        },
    );
    assert_eq!(state.documents()[1].id, "doc-2");
}

#[test]
fn export_renders_current_artifacts() {
    let (state, _) = update(AppState::new(), Msg::InputChanged("go".to_string()));
    let (state, effects) = update(
        state,
        Msg::Submitted {
            at: "t".to_string(),
        },
    );
    let Some(Effect::StartRequest { request_id, .. }) = effects.first().cloned() else {
        panic!("expected start effect");
    };
    let (state, _) = update(
        state,
        Msg::StreamChunk {
            request_id,
            text: r#"{"summary":{"output":"Stable cash flow"},"memo":{"output":"Approve","sections":[{"title":"Collateral","content":"Plant"}]}}"#
                .to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::StreamDone {
            request_id,
            at: "t".to_string(),
        },
    );
    let (_state, effects) = update(state, Msg::ExportRequested);

    let [Effect::ExportReport { markdown, html }] = effects.as_slice() else {
        panic!("expected export effect, got {effects:?}");
    };
    assert!(markdown.contains("## Summary\n\nStable cash flow"));
    assert!(markdown.contains("### Collateral\n\nPlant"));
    assert!(html.contains("<h2>Credit Memo</h2>"));
}
