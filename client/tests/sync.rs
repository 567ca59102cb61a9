//! End-to-end tests against a scripted in-process document service.
//!
//! Each test binds a websocket listener on an ephemeral port, accepts one
//! connection, and answers every decoded request with whatever frames the
//! test's handler returns.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use client::{ClientConfig, ClientError, Editor, MemoryStorage, Requester, SessionClient, SyncClient};
use frames::{Command, Event, Request};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

// =============================================================
// Scripted service
// =============================================================

async fn serve<F>(handler: F) -> ClientConfig
where
    F: Fn(Request) -> Vec<String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (mut tx, mut rx) = ws.split();
        while let Some(Ok(message)) = rx.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let request = frames::decode_request(text.as_str()).unwrap();
            for reply in handler(request) {
                if tx.send(Message::Text(reply.into())).await.is_err() {
                    return;
                }
            }
        }
    });
    ClientConfig {
        ws_url: format!("ws://{addr}"),
        request_timeout: Duration::from_millis(500),
        ..ClientConfig::default()
    }
}

/// In-memory document service that behaves like the real one.
#[derive(Default)]
struct DocService {
    files: Mutex<BTreeMap<String, String>>,
    echo_ids: bool,
}

impl DocService {
    fn handle(&self, request: Request) -> Vec<String> {
        let mut reply = match request.command {
            Command::Login { username, password } if password == "pw" => {
                json!({"action": "login", "sessionId": format!("tok-{username}")})
            }
            Command::Login { .. } => json!({"error": "Invalid username or password"}),
            Command::CreateUser { .. } => json!({"action": "createUser", "message": "User created"}),
            Command::Logout { .. } => return Vec::new(),
            Command::GetFileList { .. } => {
                let names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
                json!({"action": "fileList", "fileList": names})
            }
            Command::GetFileByName { file_name, .. } => match self.files.lock().unwrap().get(&file_name) {
                Some(markup) => json!({"action": "svgData", "svgData": markup}),
                None => json!({"action": "getFileByName", "error": "File not found"}),
            },
            Command::SaveSvg { file_name, svg_data, .. } => {
                self.files.lock().unwrap().insert(file_name.clone(), svg_data);
                json!({"action": "saveSVG", "fileName": file_name})
            }
        };
        if self.echo_ids {
            if let (Some(id), Value::Object(map)) = (request.request_id, &mut reply) {
                map.insert("requestId".into(), Value::String(id));
            }
        }
        vec![reply.to_string()]
    }
}

async fn serve_docs(service: DocService) -> ClientConfig {
    let service = Arc::new(service);
    serve(move |request| service.handle(request)).await
}

fn editor(sync: SyncClient) -> Editor<SyncClient, MemoryStorage> {
    Editor::new(sync, SessionClient::new(MemoryStorage::new()))
}

fn list_command() -> Command {
    Command::GetFileList { session_id: "tok".into() }
}

// =============================================================
// Scenarios
// =============================================================

#[tokio::test]
async fn file_list_reply_replaces_list() {
    let config = serve(|request| match request.command {
        Command::Login { .. } => vec![json!({"action": "login", "sessionId": "tok"}).to_string()],
        Command::GetFileList { .. } => vec![json!({"action": "fileList", "fileList": ["a.svg", "b.svg"]}).to_string()],
        _ => Vec::new(),
    })
    .await;
    let mut editor = editor(SyncClient::open(&config).await.unwrap());

    editor.login("ada", "pw").await.unwrap();
    let names = editor.refresh_file_list().await.unwrap();
    assert_eq!(names, ["a.svg", "b.svg"]);
}

#[tokio::test]
async fn save_then_load_returns_identical_markup() {
    for echo_ids in [false, true] {
        let config = serve_docs(DocService { echo_ids, ..DocService::default() }).await;
        let mut editor = editor(SyncClient::open(&config).await.unwrap());
        editor.register("ada", "pw").await.unwrap();

        editor.save_document("drawing.svg").await.unwrap();
        let saved = editor.document().unwrap().svg_markup.clone();
        let saved_shapes = editor.store().all().to_vec();

        editor.load_document("drawing.svg").await.unwrap();
        assert_eq!(editor.document().unwrap().svg_markup, saved, "echo_ids={echo_ids}");
        assert_eq!(editor.store().all(), saved_shapes.as_slice());
        assert_eq!(editor.refresh_file_list().await.unwrap(), ["drawing.svg"]);
    }
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let config = serve_docs(DocService::default()).await;
    let mut editor = editor(SyncClient::open(&config).await.unwrap());

    let err = editor.login("ada", "wrong").await.unwrap_err();
    match err {
        ClientError::Server { action, message } => {
            assert_eq!(action, "login");
            assert_eq!(message, "Invalid username or password");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert!(!editor.session().is_logged_in());
    assert!(editor.take_error().is_some());
}

#[tokio::test]
async fn missing_document_error_names_action() {
    let config = serve_docs(DocService::default()).await;
    let mut editor = editor(SyncClient::open(&config).await.unwrap());
    editor.login("ada", "pw").await.unwrap();

    let err = editor.load_document("nope.svg").await.unwrap_err();
    assert!(matches!(err, ClientError::Server { ref action, .. } if action == "getFileByName"));
    assert_eq!(editor.store().len(), 2);
}

#[tokio::test]
async fn malformed_frames_are_dropped_and_connection_survives() {
    let config = serve(|request| match request.command {
        Command::GetFileList { .. } => vec![
            "not json".to_owned(),
            "[1, 2]".to_owned(),
            json!({"fileList": ["legacy.svg"]}).to_string(),
            json!({"action": "mystery", "x": 1}).to_string(),
            json!({"action": "fileList", "fileList": ["ok.svg"]}).to_string(),
        ],
        _ => Vec::new(),
    })
    .await;
    let sync = SyncClient::open(&config).await.unwrap();

    let reply = sync.request(list_command()).await.unwrap();
    assert_eq!(reply, Event::FileList(vec!["ok.svg".into()]));
    assert!(sync.is_open());
    assert!(sync.try_next_event().is_none());
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let config = serve(|_| Vec::new()).await;
    let sync = SyncClient::open(&config).await.unwrap();

    let err = sync.request(list_command()).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout("getFileList")));
    assert_eq!(sync.pending(), 0);
    assert!(sync.is_open());
}

#[tokio::test]
async fn cancelled_request_leaves_no_pending_entry() {
    let calls = Arc::new(Mutex::new(0_u32));
    let config = serve(move |request| {
        let mut calls = calls.lock().unwrap();
        *calls += 1;
        match request.command {
            Command::GetFileList { .. } if *calls > 1 => {
                vec![json!({"action": "fileList", "fileList": ["second.svg"]}).to_string()]
            }
            _ => Vec::new(),
        }
    })
    .await;
    let sync = SyncClient::open(&config).await.unwrap();

    let cancelled = tokio::time::timeout(Duration::from_millis(50), sync.request(list_command())).await;
    assert!(cancelled.is_err());
    assert_eq!(sync.pending(), 0);

    let reply = sync.request(list_command()).await.unwrap();
    assert_eq!(reply, Event::FileList(vec!["second.svg".into()]));
}

#[tokio::test]
async fn late_reply_to_timed_out_load_is_dropped() {
    let held = Arc::new(Mutex::new(None::<String>));
    let mut config = serve(move |request| match request.command {
        Command::GetFileByName { .. } => {
            *held.lock().unwrap() = request.request_id;
            Vec::new()
        }
        Command::GetFileList { .. } => {
            let mut replies = Vec::new();
            if let Some(id) = held.lock().unwrap().take() {
                let late = json!([{"id": "late", "type": "circle", "x": 1, "y": 1, "r": 1}]).to_string();
                replies.push(json!({"action": "svgData", "svgData": late, "requestId": id}).to_string());
            }
            replies.push(json!({"action": "fileList", "fileList": ["a.svg"]}).to_string());
            replies
        }
        _ => Vec::new(),
    })
    .await;
    config.request_timeout = Duration::from_millis(200);
    let storage = MemoryStorage::with_session(client::Session { username: "ada".into(), token: "tok".into() });
    let mut editor = Editor::new(SyncClient::open(&config).await.unwrap(), SessionClient::restore(storage));
    let before = editor.store().all().to_vec();

    let err = editor.load_document("a.svg").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout("getFileByName")));

    assert_eq!(editor.refresh_file_list().await.unwrap(), ["a.svg"]);
    assert!(editor.sync().try_next_event().is_none());
    assert_eq!(editor.store().all(), before.as_slice());
    assert_eq!(editor.sync().pending(), 0);
}

#[tokio::test]
async fn replies_route_by_action_across_categories() {
    let held = Arc::new(Mutex::new(None::<String>));
    let config = serve(move |request| match request.command {
        Command::Login { .. } => {
            *held.lock().unwrap() = Some(json!({"action": "login", "sessionId": "tok"}).to_string());
            Vec::new()
        }
        Command::GetFileList { .. } => {
            let mut replies = vec![json!({"action": "fileList", "fileList": ["x.svg"]}).to_string()];
            replies.extend(held.lock().unwrap().take());
            replies
        }
        _ => Vec::new(),
    })
    .await;
    let sync = SyncClient::open(&config).await.unwrap();

    let login = sync.request(Command::Login { username: "ada".into(), password: "pw".into() });
    let list = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        sync.request(list_command()).await
    };
    let (login, list) = tokio::join!(login, list);
    assert_eq!(login.unwrap(), Event::LoggedIn { session_id: "tok".into(), username: None });
    assert_eq!(list.unwrap(), Event::FileList(vec!["x.svg".into()]));
}

#[tokio::test]
async fn unsolicited_frames_reach_event_stream() {
    let config = serve(|request| match request.command {
        Command::Login { .. } => vec![
            json!({"action": "fileList", "fileList": ["pushed.svg"]}).to_string(),
            json!({"action": "login", "sessionId": "tok"}).to_string(),
            json!({"error": "Server busy"}).to_string(),
        ],
        _ => Vec::new(),
    })
    .await;
    let mut editor = editor(SyncClient::open(&config).await.unwrap());
    editor.login("ada", "pw").await.unwrap();

    let pushed = tokio::time::timeout(Duration::from_secs(1), editor.sync().next_event()).await.unwrap().unwrap();
    assert!(editor.apply_event(pushed));
    assert_eq!(editor.file_list(), ["pushed.svg"]);

    let error = tokio::time::timeout(Duration::from_secs(1), editor.sync().next_event()).await.unwrap().unwrap();
    assert!(error.is_error());
    editor.apply_event(error);
    assert_eq!(editor.take_error().as_deref(), Some("Server busy"));
}

#[tokio::test]
async fn closed_transport_fails_requests_but_logout_still_clears() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
    });
    let config = ClientConfig { ws_url: format!("ws://{addr}"), ..ClientConfig::default() };

    let storage = MemoryStorage::with_session(client::Session { username: "ada".into(), token: "tok".into() });
    let mut editor = Editor::new(SyncClient::open(&config).await.unwrap(), SessionClient::restore(storage));

    tokio::time::timeout(Duration::from_secs(2), async {
        while editor.sync().is_open() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let err = editor.refresh_file_list().await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected));

    editor.logout().await;
    assert!(!editor.session().is_logged_in());
}

#[tokio::test]
async fn close_stops_the_client() {
    let config = serve(|_| Vec::new()).await;
    let mut sync = SyncClient::open(&config).await.unwrap();
    sync.close().await;
    assert!(!sync.is_open());
    assert!(matches!(sync.send(list_command()).await, Err(ClientError::NotConnected)));
}

#[tokio::test]
async fn open_fails_without_a_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = ClientConfig { ws_url: format!("ws://{addr}"), ..ClientConfig::default() };

    let err = SyncClient::open(&config).await.err().unwrap();
    assert!(matches!(err, ClientError::Ws(_)));
}
