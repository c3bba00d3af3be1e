//! DNS server runner: binds UDP+TCP and serves a scripted handler.

use hickory_server::server::ServerFuture;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::SimulatorConfig;
use crate::handler::ScriptedHandler;
use crate::script::ScriptedAnswers;

/// A running simulator instance.
///
/// Sockets are served as soon as [`SimulatorServer::bind`] returns.
pub struct SimulatorServer {
    server: ServerFuture<ScriptedHandler>,
    local_addr: SocketAddr,
    answers: Arc<Mutex<ScriptedAnswers>>,
}

impl SimulatorServer {
    /// Bind and serve the script described by `config`.
    pub async fn bind(config: &SimulatorConfig) -> crate::Result<Self> {
        config.validate()?;
        let handler = ScriptedHandler::new(config.script()).with_zones(&config.zones);
        Self::bind_with(config.listen, handler, config.tcp_timeout()).await
    }

    /// Bind UDP and TCP on `listen` and serve `handler`.
    ///
    /// With port 0 the UDP socket picks the port and TCP reuses it.
    pub async fn bind_with(
        listen: SocketAddr,
        handler: ScriptedHandler,
        tcp_timeout: Duration,
    ) -> crate::Result<Self> {
        let answers = handler.answers();
        let mut server = ServerFuture::new(handler);

        let udp_socket = UdpSocket::bind(listen)
            .await
            .map_err(|e| crate::SimError::Server(format!("UDP bind {listen}: {e}")))?;
        let local_addr = udp_socket.local_addr()?;
        info!(addr = %local_addr, "UDP socket bound");
        server.register_socket(udp_socket);

        let tcp_listener = TcpListener::bind(local_addr)
            .await
            .map_err(|e| crate::SimError::Server(format!("TCP bind {local_addr}: {e}")))?;
        info!(addr = %local_addr, "TCP listener bound");
        server.register_listener(tcp_listener, tcp_timeout);

        Ok(Self {
            server,
            local_addr,
            answers,
        })
    }

    /// Address both sockets are bound to
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared handle on the script being served
    #[must_use]
    pub fn answers(&self) -> Arc<Mutex<ScriptedAnswers>> {
        Arc::clone(&self.answers)
    }

    /// Serve until the sockets close or `shutdown` resolves.
    pub async fn serve_until<F>(mut self, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        let finished = tokio::select! {
            result = self.server.block_until_done() => Some(result),
            () = shutdown => None,
        };

        match finished {
            Some(result) => {
                result.map_err(|e| crate::SimError::Server(format!("server error: {e}")))
            }
            None => self.shutdown().await,
        }
    }

    /// Stop accepting queries and wait for in-flight ones.
    pub async fn shutdown(mut self) -> crate::Result<()> {
        info!(addr = %self.local_addr, "shutting down DNS simulator");
        self.server
            .shutdown_gracefully()
            .await
            .map_err(|e| crate::SimError::Server(format!("shutdown error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::query_txt;
    use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
    use hickory_proto::rr::{Name, RData, RecordType};
    use std::collections::HashMap;

    const NAME: &str = "cert-manager-dns01-tests.example.com.";
    const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

    /// Send one raw query and return the full response message.
    async fn exchange(server: SocketAddr, name: &str, record_type: RecordType) -> Message {
        let mut message = Message::new();
        message
            .set_id(0x1e55)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(false);
        message.add_query(Query::query(Name::from_ascii(name).unwrap(), record_type));

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.connect(server).await.unwrap();
        socket.send(&message.to_vec().unwrap()).await.unwrap();

        let mut buf = vec![0u8; 4096];
        let len = tokio::time::timeout(QUERY_TIMEOUT, socket.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let response = Message::from_vec(&buf[..len]).unwrap();
        assert_eq!(response.id(), 0x1e55);
        response
    }

    fn config(records: &[(&str, Vec<Vec<&str>>)]) -> SimulatorConfig {
        SimulatorConfig {
            listen: SocketAddr::from(([127, 0, 0, 1], 0)),
            zones: vec!["example.com.".into()],
            records: records
                .iter()
                .map(|(name, sets)| {
                    let sets = sets
                        .iter()
                        .map(|set| set.iter().map(|v| (*v).to_string()).collect())
                        .collect();
                    ((*name).to_string(), sets)
                })
                .collect::<HashMap<_, _>>(),
            ..SimulatorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_scripted_sequence_over_udp() {
        let server = SimulatorServer::bind(&config(&[(
            NAME,
            vec![vec![], vec![], vec!["123d=="], vec!["123d=="]],
        )]))
        .await
        .unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(query_txt(addr, NAME, QUERY_TIMEOUT).await.unwrap());
        }
        let expected: Vec<Vec<String>> = vec![
            vec![],
            vec![],
            vec!["123d==".into()],
            vec!["123d==".into()],
            vec![],
        ];
        assert_eq!(seen, expected);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_txt_records_are_authoritative_with_short_ttl() {
        let server = SimulatorServer::bind(&config(&[(NAME, vec![vec!["a", "b"]])]))
            .await
            .unwrap();

        let response = exchange(server.local_addr(), NAME, RecordType::TXT).await;
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert!(response.header().authoritative());
        assert_eq!(response.answers().len(), 2);
        assert!(response.answers().iter().all(|r| r.ttl() == 1));

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_long_values_are_served_as_one_record() {
        let token = "k".repeat(300);
        let server = SimulatorServer::bind(&config(&[(NAME, vec![vec![token.as_str()]])]))
            .await
            .unwrap();

        let response = exchange(server.local_addr(), NAME, RecordType::TXT).await;
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert_eq!(response.answers().len(), 1);
        let RData::TXT(txt) = response.answers()[0].data() else {
            panic!("expected a TXT record");
        };
        assert_eq!(txt.txt_data().len(), 2);
        assert_eq!(txt.txt_data().concat(), token.as_bytes());

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_other_types_do_not_advance_cursor() {
        let server = SimulatorServer::bind(&config(&[(NAME, vec![vec!["abc"]])]))
            .await
            .unwrap();
        let addr = server.local_addr();

        let response = exchange(addr, NAME, RecordType::A).await;
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert!(response.answers().is_empty());
        assert_eq!(server.answers().lock().await.cursor(NAME), 0);

        assert_eq!(
            query_txt(addr, NAME, QUERY_TIMEOUT).await.unwrap(),
            vec!["abc".to_string()]
        );

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_names_outside_zones_are_refused() {
        let server = SimulatorServer::bind(&config(&[])).await.unwrap();

        let response = exchange(
            server.local_addr(),
            "_acme-challenge.example.org.",
            RecordType::TXT,
        )
        .await;
        assert_eq!(response.response_code(), ResponseCode::Refused);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_query_names_ignore_case() {
        let server = SimulatorServer::bind(&config(&[(NAME, vec![vec!["abc"]])]))
            .await
            .unwrap();

        let values = query_txt(
            server.local_addr(),
            "Cert-Manager-DNS01-Tests.Example.COM",
            QUERY_TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(values, vec!["abc".to_string()]);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let script = config(&[(NAME, vec![vec!["abc"]])]);
        let first = SimulatorServer::bind(&script).await.unwrap();
        let second = SimulatorServer::bind(&script).await.unwrap();

        assert_eq!(
            query_txt(first.local_addr(), NAME, QUERY_TIMEOUT).await.unwrap(),
            vec!["abc".to_string()]
        );
        assert_eq!(
            query_txt(second.local_addr(), NAME, QUERY_TIMEOUT).await.unwrap(),
            vec!["abc".to_string()]
        );

        first.shutdown().await.unwrap();
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_serve_until_shutdown_signal() {
        let server = SimulatorServer::bind(&config(&[])).await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(server.serve_until(async {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        tokio_test::assert_ok!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_config_does_not_bind() {
        let bad = config(&[("www.example.org.", vec![])]);
        assert!(matches!(
            SimulatorServer::bind(&bad).await,
            Err(crate::SimError::Config(_))
        ));
    }
}
