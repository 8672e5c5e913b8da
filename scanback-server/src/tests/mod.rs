
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, header},
};
use scanback_config::{
    AuthConfig, Config, ConfigMetadata, ScannerConfig, ServerConfig,
};
use scanback_core::{ScanQueueReceiver, scan_queue};

use crate::{AppState, auth::BasicCredentials, routes::create_app};

pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        auth: AuthConfig {
            realm: "example.org".into(),
            username: "alice".into(),
            password: "secret".into(),
        },
        scanner: ScannerConfig {
            nmap_path: PathBuf::from("nmap"),
            scan_directory: PathBuf::from("scans"),
        },
        tls: None,
        metadata: ConfigMetadata::default(),
    }
}

/// Router wired to a queue whose receiver stays in the test's hands.
pub(crate) fn test_app() -> (Router, ScanQueueReceiver, AppState) {
    let (queue, receiver) = scan_queue();
    let state = AppState::new(Arc::new(test_config()), queue);
    (create_app(state.clone()), receiver, state)
}

pub(crate) fn request_from(
    peer: IpAddr,
    method: Method,
    credentials: Option<(&str, &str)>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/");
    if let Some((user, pass)) = credentials {
        builder = builder.header(
            header::AUTHORIZATION,
            BasicCredentials::new(user, pass).to_header_value(),
        );
    }

    let mut request = builder.body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(peer, 54321)));
    request
}
