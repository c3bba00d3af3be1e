//! Request handler answering TXT queries from a [`ScriptedAnswers`] script.

use async_trait::async_trait;
use hickory_proto::op::{Header, OpCode, ResponseCode};
use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{RData, Record, RecordType};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, trace};

use crate::script::{normalize_name, within_zone, ScriptedAnswers};

/// TTL of every synthesized TXT record.
pub const ANSWER_TTL: u32 = 1;

/// Longest character-string a TXT record can carry in one piece.
const TXT_CHUNK_LEN: usize = 255;

/// Answers DNS queries from a shared script.
///
/// The script lock is held for the whole of one query, response write
/// included, so queries for a name observe the cursor strictly in order.
#[derive(Debug, Clone)]
pub struct ScriptedHandler {
    answers: Arc<Mutex<ScriptedAnswers>>,
    zones: Vec<String>,
}

impl ScriptedHandler {
    /// Create a handler answering for any name
    #[must_use]
    pub fn new(answers: ScriptedAnswers) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers)),
            zones: Vec::new(),
        }
    }

    /// Restrict answers to names inside `zones`; others get REFUSED
    #[must_use]
    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.zones = zones.into_iter().map(|z| normalize_name(z.as_ref())).collect();
        self
    }

    /// Shared handle on the script, for inspection or re-scripting
    #[must_use]
    pub fn answers(&self) -> Arc<Mutex<ScriptedAnswers>> {
        Arc::clone(&self.answers)
    }

    /// Whether `name` (normalized) falls inside a configured zone
    fn in_zone(&self, name: &str) -> bool {
        self.zones.is_empty() || self.zones.iter().any(|zone| within_zone(name, zone))
    }

    async fn send_error<R: ResponseHandler>(
        request: &Request,
        mut response_handle: R,
        code: ResponseCode,
    ) -> ResponseInfo {
        let response =
            MessageResponseBuilder::from_message_request(request).error_msg(request.header(), code);
        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "failed to send DNS error response");
                serve_failed(request)
            }
        }
    }
}

#[async_trait]
impl RequestHandler for ScriptedHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        if request.op_code() != OpCode::Query {
            debug!(op_code = ?request.op_code(), "unsupported opcode");
            return Self::send_error(request, response_handle, ResponseCode::NotImp).await;
        }

        let [query] = request.queries() else {
            debug!(count = request.queries().len(), "expected exactly one question");
            return Self::send_error(request, response_handle, ResponseCode::FormErr).await;
        };

        let name = normalize_name(&query.name().to_string());
        if !self.in_zone(&name) {
            debug!(name = %name, "query outside configured zones");
            return Self::send_error(request, response_handle, ResponseCode::Refused).await;
        }

        let mut answers = self.answers.lock().await;

        let records: Vec<Record> = if query.query_type() == RecordType::TXT {
            let values = answers.next_answer(&name);
            trace!(
                name = %name,
                cursor = answers.cursor(&name),
                values = ?values,
                "scripted answer"
            );
            values
                .into_iter()
                .map(|value| {
                    Record::from_rdata(
                        query.original().name().clone(),
                        ANSWER_TTL,
                        RData::TXT(txt_rdata(&value)),
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);

        let response = MessageResponseBuilder::from_message_request(request).build(
            header,
            records.iter(),
            std::iter::empty(),
            std::iter::empty(),
            std::iter::empty(),
        );

        let info = match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!(name = %name, error = %e, "failed to send DNS response");
                serve_failed(request)
            }
        };

        drop(answers);
        info
    }
}

/// Split `value` into as many character-strings as it needs.
fn txt_rdata(value: &str) -> TXT {
    if value.is_empty() {
        return TXT::from_bytes(vec![&b""[..]]);
    }
    TXT::from_bytes(value.as_bytes().chunks(TXT_CHUNK_LEN).collect())
}

fn serve_failed(request: &Request) -> ResponseInfo {
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(ResponseCode::ServFail);
    header.into()
}
