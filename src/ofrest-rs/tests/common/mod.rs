//! Stub Openfire server for exercising the blocking client.
//!
//! [`serve`] runs an actix-web server on `127.0.0.1:0`. Each request gets
//! the next canned response and is recorded for the test to inspect.

use std::collections::{HashMap, VecDeque};
use std::net::TcpListener;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path including the query string, as sent on the wire
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

struct StubState {
    responses: Mutex<VecDeque<(u16, &'static str)>>,
    recorded: Mutex<mpsc::Sender<Recorded>>,
}

async fn respond(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or_default().to_string();
            (name.as_str().to_ascii_lowercase(), value)
        })
        .collect();

    state
        .recorded
        .lock()
        .expect("recorder lock")
        .send(Recorded {
            method: req.method().to_string(),
            target: req.uri().to_string(),
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
        .expect("test is waiting for requests");

    match state.responses.lock().expect("responses lock").pop_front() {
        Some((status, body)) => {
            HttpResponse::build(StatusCode::from_u16(status).expect("valid status code"))
                .content_type("application/json")
                .body(body)
        }
        None => HttpResponse::InternalServerError().body("no canned response left"),
    }
}

pub struct Stub {
    pub base_url: String,
    requests: mpsc::Receiver<Recorded>,
    handle: ServerHandle,
}

impl Stub {
    pub fn next_request(&self) -> Recorded {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("stub received a request")
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        // The stop command is queued immediately; waiting for shutdown is not needed.
        drop(self.handle.stop(false));
    }
}

/// Serve the given `(status, body)` pairs, one per request, in order.
pub fn serve(responses: Vec<(u16, &'static str)>) -> Stub {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let (recorded_tx, recorded_rx) = mpsc::channel();
    let (handle_tx, handle_rx) = mpsc::channel();

    let state = web::Data::new(StubState {
        responses: Mutex::new(responses.into()),
        recorded: Mutex::new(recorded_tx),
    });

    thread::spawn(move || {
        actix_web::rt::System::new().block_on(async move {
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .default_service(web::to(respond))
            })
            .disable_signals()
            .workers(1)
            .listen(listener)
            .expect("listen on stub socket")
            .run();

            handle_tx.send(server.handle()).expect("hand back server handle");
            server.await.expect("stub server");
        })
    });

    Stub {
        base_url: format!("http://{addr}"),
        requests: recorded_rx,
        handle: handle_rx.recv().expect("stub server started"),
    }
}
