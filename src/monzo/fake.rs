//! In-process stand-in for the Monzo API and authorization server.

use crate::config::ApiConfig;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) url: String,
    pub(crate) authorization: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) body: String,
}

/// Answers from a table of `(method, path prefix) -> (status, body)`, first match wins
pub(crate) struct FakeMonzo {
    pub(crate) base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeMonzo {
    pub(crate) fn start(routes: Vec<(&'static str, &'static str, u16, String)>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                request.as_reader().read_to_string(&mut body).unwrap();
                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv(name))
                        .map(|h| h.value.to_string())
                };
                let authorization = header("Authorization");
                let content_type = header("Content-Type");
                let method = request.method().to_string();
                let url = request.url().to_string();

                recorded.lock().unwrap().push(RecordedRequest {
                    method: method.clone(),
                    url: url.clone(),
                    authorization,
                    content_type,
                    body,
                });

                let (status, body) = routes
                    .iter()
                    .find(|(m, prefix, _, _)| *m == method && url.starts_with(prefix))
                    .map(|(_, _, status, body)| (*status, body.clone()))
                    .unwrap_or((404, r#"{"code":"not_found","message":"no route"}"#.to_string()));

                let header = Header::from_bytes("Content-Type", "application/json").unwrap();
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    pub(crate) fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            auth_url: format!("{}/auth", self.base_url),
            token_url: format!("{}/oauth2/token", self.base_url),
        }
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) const WHOAMI: &str =
    r#"{"authenticated":true,"client_id":"oauth2client_123","user_id":"user_123"}"#;

pub(crate) const TOKEN_RESPONSE: &str = r#"{"access_token":"new_access","token_type":"Bearer","expires_in":21600,"refresh_token":"refresh_2"}"#;
