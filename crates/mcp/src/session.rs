// Session state machine: one logical conversation with one client

use crate::dispatch::Dispatcher;
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
use uuid::Uuid;

/// Session lifecycle. Only a well-formed `initialize` request advances
/// Initializing to Ready; anything else is rejected without closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Ready,
    Closed,
}

/// One stateful conversation between a client and this server,
/// independent of the transport carrying it. The transport owns the
/// channels; the session owns the protocol state machine.
pub struct Session {
    id: Uuid,
    state: SessionState,
    dispatcher: Dispatcher,
    info: ServerInfo,
    instructions: Option<String>,
}

impl Session {
    pub fn new(dispatcher: Dispatcher, info: ServerInfo, instructions: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Initializing,
            dispatcher,
            info,
            instructions,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Mark the session closed. Idempotent; a closed session answers
    /// nothing.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            tracing::debug!(session = %self.id, "session closed");
            self.state = SessionState::Closed;
        }
    }

    /// Decode one wire message and run it through the state machine.
    /// A line that is not valid JSON-RPC gets a parse-error response.
    pub async fn handle_raw(&mut self, raw: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => Some(JsonRpcResponse::error(
                serde_json::Value::Null,
                JsonRpcError::parse_error(err.to_string()),
            )),
        }
    }

    /// Handle one decoded message. Returns `None` for notifications and
    /// for anything received after close.
    pub async fn handle(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if self.state == SessionState::Closed {
            return None;
        }

        if request.is_notification() {
            match request.method.as_str() {
                "notifications/initialized" => {
                    tracing::debug!(session = %self.id, "client confirmed initialization");
                }
                other => {
                    tracing::debug!(session = %self.id, "ignoring notification: {}", other);
                }
            }
            return None;
        }

        // Checked by is_notification above.
        let id = request.id.unwrap_or(serde_json::Value::Null);

        let response = match (self.state, request.method.as_str()) {
            (SessionState::Initializing, "initialize") => {
                self.initialize(id, request.params.unwrap_or_default())
            }
            (SessionState::Initializing, method) => {
                tracing::warn!(session = %self.id, "request '{}' before initialize", method);
                JsonRpcResponse::error(id, JsonRpcError::not_initialized())
            }
            (SessionState::Ready, "initialize") => JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("initialize already completed"),
            ),
            (SessionState::Ready, "ping") => JsonRpcResponse::success(id, serde_json::json!({})),
            (SessionState::Ready, "tools/list") => {
                let result = ListToolsResult {
                    tools: self.dispatcher.registry().schemas(),
                };
                JsonRpcResponse::success(id, to_value(&result))
            }
            (SessionState::Ready, "tools/call") => {
                match serde_json::from_value::<CallToolParams>(request.params.unwrap_or_default())
                {
                    Ok(params) => {
                        let result = self.dispatcher.dispatch(params).await;
                        JsonRpcResponse::success(id, to_value(&result))
                    }
                    Err(err) => JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("invalid tools/call params: {}", err)),
                    ),
                }
            }
            (_, method) => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };

        Some(response)
    }

    fn initialize(&mut self, id: serde_json::Value, params: serde_json::Value) -> JsonRpcResponse {
        // Absent params are tolerated; present-but-wrong ones are not.
        let params: InitializeParams = if params.is_null() {
            InitializeParams::default()
        } else {
            match serde_json::from_value(params) {
                Ok(params) => params,
                Err(err) => {
                    // Stays Initializing; the client may retry.
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("invalid initialize params: {}", err)),
                    );
                }
            }
        };

        if let Some(client) = &params.client_info {
            tracing::info!(
                session = %self.id,
                "initialized by client {} {}", client.name, client.version
            );
        } else {
            tracing::info!(session = %self.id, "initialized by anonymous client");
        }

        self.state = SessionState::Ready;
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        };
        JsonRpcResponse::success(id, to_value(&result))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::error!("failed to serialize response payload: {}", err);
        serde_json::Value::Null
    })
}
