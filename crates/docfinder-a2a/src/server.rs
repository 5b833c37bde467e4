//! A2A Protocol Server
//!
//! Exposes an [`AgentExecutor`] over HTTP: agent card discovery, the JSON-RPC
//! endpoint at `/a2a`, the HTTP+JSON binding under `/a2a/rest/v1`, and a
//! health check.
//!
//! # Example
//!
//! ```rust,ignore
//! use docfinder_a2a::{A2aServer, ServerConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfigBuilder::from_env()?.build()?;
//!     let server = A2aServer::with_config(MyExecutor::default(), config);
//!     server.start_cleanup_task();
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use futures::FutureExt;
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tower_http::{
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::bus::{EventBus, StoreEventBus};
use crate::config::ServerConfig;
use crate::error::{A2aError, A2aResult, ErrorResponse, codes};
use crate::executor::{AgentExecutor, RequestContext};
use crate::normalize;
use crate::shutdown::shutdown_signal;
use crate::store::TaskStore;
use crate::types::{
    AgentCard, JSONRPC_VERSION, JsonRpcId, JsonRpcResponse, RpcMethod, SendMessageParams, Task,
    TaskIdParams, TaskQueryParams, TaskState, TaskStatus, Transport,
};

/// Path of the JSON-RPC endpoint
pub const JSONRPC_PATH: &str = "/a2a";

/// Prefix of the HTTP+JSON binding
pub const REST_PREFIX: &str = "/a2a/rest/v1";

/// Path the root URL redirects to
pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";

/// Message used for failures whose detail is hidden outside debug mode
const GENERIC_INTERNAL_ERROR: &str = "Internal error";

/// Shared application state
struct AppState<E: AgentExecutor> {
    executor: Arc<E>,
    store: Arc<TaskStore>,
    config: Arc<ServerConfig>,
}

impl<E: AgentExecutor> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

/// A2A Protocol Server
pub struct A2aServer<E: AgentExecutor> {
    executor: Arc<E>,
    store: Arc<TaskStore>,
    config: Arc<ServerConfig>,
}

impl<E: AgentExecutor> A2aServer<E> {
    /// Create a server with default configuration
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, ServerConfig::default())
    }

    /// Create a server with the given configuration
    pub fn with_config(executor: E, config: ServerConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            store: Arc::new(TaskStore::with_config(config.store.clone())),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start a background task that periodically cleans up expired tasks
    ///
    /// Returns a handle that can be used to abort the cleanup task.
    pub fn start_cleanup_task(&self) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let interval_secs = store.config().cleanup_interval_secs;

        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));

            loop {
                interval.tick().await;
                store.cleanup_expired().await;
            }
        })
    }

    /// Manually trigger cleanup of expired tasks
    pub async fn cleanup_expired_tasks(&self) -> usize {
        self.store.cleanup_expired().await
    }

    /// Get the current task count
    pub async fn task_count(&self) -> usize {
        self.store.task_count().await
    }

    /// Build the agent card as seen through the given request headers
    pub fn agent_card(&self, headers: &HeaderMap) -> AgentCard {
        self.state().agent_card(headers)
    }

    fn state(&self) -> AppState<E> {
        AppState {
            executor: Arc::clone(&self.executor),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }

    /// Build the Axum router for this server
    pub fn router(&self) -> Router {
        let rest = Router::new()
            .route("/message:send", post(rest_send_message::<E>))
            .route("/message:stream", post(rest_unsupported))
            .route(
                "/tasks/{task_ref}",
                get(rest_get_task::<E>).post(rest_task_action::<E>),
            );

        let mut router = Router::new()
            .route("/", get(root_redirect))
            .route("/.well-known/agent.json", get(get_agent_card::<E>))
            .route(AGENT_CARD_PATH, get(get_agent_card::<E>))
            .route("/health", get(health_check::<E>))
            .route(JSONRPC_PATH, post(jsonrpc_endpoint::<E>))
            .nest(REST_PREFIX, rest)
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .with_state(self.state())
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(AnyOrigin)
                    .allow_methods(AnyOrigin)
                    .allow_headers(AnyOrigin),
            );
        }

        router
    }

    /// Serve until SIGINT or SIGTERM is received
    pub async fn serve(self) -> A2aResult<()> {
        let addr = self.config.bind_addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| A2aError::internal_error(format!("Failed to bind to {addr}: {e}")))?;

        info!(
            name = %self.config.identity.name,
            version = %self.config.identity.version,
            address = %addr,
            strict_cancel = self.config.strict_cancel,
            "A2A server starting"
        );

        let router = self.router();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| A2aError::internal_error(format!("Server error: {e}")))?;

        info!("A2A server stopped");
        Ok(())
    }
}

impl<E: AgentExecutor> AppState<E> {
    /// Create or continue a task and run the executor on it to completion
    async fn send_message(&self, params: SendMessageParams) -> A2aResult<Task> {
        let SendMessageParams {
            mut message,
            configuration,
            metadata,
        } = params;
        let history_length = configuration.and_then(|c| c.history_length);

        let existing = match message.task_id.as_deref() {
            Some(task_id) => self.store.get(task_id).await,
            None => None,
        };

        let (task_id, context_id) = match existing {
            Some(mut task) => {
                if task.is_terminal() {
                    return Err(A2aError::invalid_params(format!(
                        "task {} is already {}",
                        task.id,
                        task.state()
                    )));
                }
                message.task_id = Some(task.id.clone());
                message.context_id = Some(task.context_id.clone());
                task.add_message(message.clone());
                let ids = (task.id.clone(), task.context_id.clone());
                self.store.insert(task).await;
                debug!(task_id = %ids.0, "Continuing existing task");
                ids
            }
            None => {
                let task_id = message
                    .task_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let context_id = message
                    .context_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                message.task_id = Some(task_id.clone());
                message.context_id = Some(context_id.clone());

                let mut task = Task::new(&task_id, &context_id);
                task.add_message(message.clone());
                self.store.insert(task).await;
                info!(task_id = %task_id, context_id = %context_id, "Task submitted");
                (task_id, context_id)
            }
        };

        let ctx = RequestContext {
            task_id,
            context_id,
            message,
            metadata,
        };
        self.run_executor(&ctx).await;

        let task = self
            .store
            .get(&ctx.task_id)
            .await
            .ok_or_else(|| A2aError::internal_error("task vanished during execution"))?;

        if task.state() == TaskState::Failed {
            let (code, message) = task
                .status
                .error
                .as_ref()
                .map(|e| (e.code, e.message.clone()))
                .unwrap_or((codes::INTERNAL_ERROR, GENERIC_INTERNAL_ERROR.to_string()));
            return Err(A2aError::TaskFailed {
                task_id: task.id,
                context_id: task.context_id,
                code,
                message,
            });
        }

        Ok(task.with_history_length(history_length))
    }

    /// Run the executor, converting errors, panics and a missing final
    /// event into a `failed` status
    async fn run_executor(&self, ctx: &RequestContext) {
        let bus = StoreEventBus::new(Arc::clone(&self.store));
        let outcome = AssertUnwindSafe(self.executor.execute(ctx, &bus))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(panic_detail(&*payload)),
        };

        if let Some(detail) = &failure {
            error!(task_id = %ctx.task_id, error = %detail, "Agent executor failed");
        }
        if bus.has_final().await {
            return;
        }

        let detail = failure.unwrap_or_else(|| "executor finished without a final status".into());
        warn!(task_id = %ctx.task_id, detail = %detail, "Marking task failed");
        let message = if self.config.debug {
            format!("{GENERIC_INTERNAL_ERROR}: {detail}")
        } else {
            GENERIC_INTERNAL_ERROR.to_string()
        };
        bus.emit_status(ctx.status_event(TaskStatus::failed(codes::INTERNAL_ERROR, message), true))
            .await;
    }

    async fn get_task(&self, params: TaskQueryParams) -> A2aResult<Task> {
        debug!(task_id = %params.id, "Getting task");
        self.store
            .get(&params.id)
            .await
            .map(|task| task.with_history_length(params.history_length))
            .ok_or_else(|| A2aError::task_not_found(&params.id))
    }

    async fn cancel_task(&self, params: TaskIdParams) -> A2aResult<Task> {
        debug!(task_id = %params.id, "Canceling task");
        self.store.cancel(&params.id, self.config.strict_cancel).await
    }

    /// Handle one JSON-RPC request body. Always produces an envelope.
    async fn handle_jsonrpc(&self, body: &[u8]) -> JsonRpcResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => return self.respond(JsonRpcId::Null, Err(A2aError::parse_error(e.to_string()))),
        };

        let Value::Object(mut request) = value else {
            return self.respond(
                JsonRpcId::Null,
                Err(A2aError::invalid_request("request must be a JSON object")),
            );
        };
        let id = JsonRpcId::from_value(request.get("id"));

        if !request.contains_key("jsonrpc")
            && !request.contains_key("method")
            && request.contains_key("message")
        {
            debug!("Treating bare message body as message/send");
            let result = self.rpc_send(Value::Object(request)).await;
            return self.respond(JsonRpcId::Null, result);
        }

        if request.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return self.respond(
                id,
                Err(A2aError::invalid_request("jsonrpc must be exactly \"2.0\"")),
            );
        }
        let Some(method) = request
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            return self.respond(id, Err(A2aError::invalid_request("method must be a string")));
        };
        let params = request.remove("params").unwrap_or(Value::Null);

        debug!(method = %method, id = %id, "JSON-RPC request");
        let result = match RpcMethod::parse(&method) {
            None => Err(A2aError::method_not_found(method)),
            Some(RpcMethod::Unsupported(name)) => Err(A2aError::unsupported(name)),
            Some(RpcMethod::SendMessage) => self.rpc_send(params).await,
            Some(RpcMethod::GetTask) => match parse_params::<TaskQueryParams>(params) {
                Ok(params) => self.get_task(params).await.and_then(to_value),
                Err(e) => Err(e),
            },
            Some(RpcMethod::CancelTask) => match parse_params::<TaskIdParams>(params) {
                Ok(params) => self.cancel_task(params).await.and_then(to_value),
                Err(e) => Err(e),
            },
        };

        self.respond(id, result)
    }

    async fn rpc_send(&self, params: Value) -> A2aResult<Value> {
        let params = normalize::send_message_params(params)?;
        self.send_message(params).await.and_then(to_value)
    }

    fn respond(&self, id: JsonRpcId, result: A2aResult<Value>) -> JsonRpcResponse {
        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                let e = self.public_error(e);
                debug!(id = %id, code = e.code(), error = %e, "JSON-RPC error");
                JsonRpcResponse::error(id, ErrorResponse::from(e).into())
            }
        }
    }

    /// Hide internal error detail unless debug mode is on
    fn public_error(&self, err: A2aError) -> A2aError {
        match err {
            A2aError::InternalError { message } => {
                error!(error = %message, "Internal error");
                if self.config.debug {
                    A2aError::InternalError { message }
                } else {
                    A2aError::internal_error("unexpected failure")
                }
            }
            other => other,
        }
    }

    /// Base URL as seen by the caller
    fn resolve_base_url(&self, headers: &HeaderMap) -> String {
        if let Some(base) = self.config.base_url() {
            return base;
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let proto = header("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
        let host = header("x-forwarded-host")
            .or_else(|| header("host"))
            .unwrap_or_else(|| self.config.bind_addr.to_string());
        format!("{proto}://{host}")
    }

    fn agent_card(&self, headers: &HeaderMap) -> AgentCard {
        let base = self.resolve_base_url(headers);
        let identity = &self.config.identity;
        let jsonrpc_url = format!("{base}{JSONRPC_PATH}");

        let mut card = AgentCard::new(&identity.name, &identity.version, &jsonrpc_url)
            .with_description(&identity.description)
            .with_interface(Transport::JsonRpc, &jsonrpc_url)
            .with_interface(Transport::HttpJson, format!("{base}{REST_PREFIX}"))
            .with_skills(self.executor.skills());
        card.capabilities.state_transition_history = true;
        card
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> A2aResult<T> {
    serde_json::from_value(params).map_err(|e| A2aError::invalid_params(e.to_string()))
}

fn to_value(task: Task) -> A2aResult<Value> {
    Ok(serde_json::to_value(task)?)
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("executor panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("executor panicked: {message}")
    } else {
        "executor panicked".to_string()
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /.well-known/agent.json and /.well-known/agent-card.json
async fn get_agent_card<E: AgentExecutor>(
    State(state): State<AppState<E>>,
    headers: HeaderMap,
) -> Json<AgentCard> {
    let card = state.agent_card(&headers);
    debug!(url = %card.url, "Serving agent card");
    Json(card)
}

/// GET / - point browsers and crawlers at the agent card
async fn root_redirect() -> Redirect {
    Redirect::temporary(AGENT_CARD_PATH)
}

/// GET /health
async fn health_check<E: AgentExecutor>(State(state): State<AppState<E>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.identity.name,
        "version": state.config.identity.version,
        "function": state.config.function_name,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /a2a - JSON-RPC 2.0, always answered with HTTP 200
async fn jsonrpc_endpoint<E: AgentExecutor>(
    State(state): State<AppState<E>>,
    body: Result<Bytes, BytesRejection>,
) -> Json<JsonRpcResponse> {
    match body {
        Ok(body) => Json(state.handle_jsonrpc(&body).await),
        Err(rejection) => {
            let err = body_rejection(rejection, state.config.max_body_size);
            Json(state.respond(JsonRpcId::Null, Err(err)))
        }
    }
}

/// POST /a2a/rest/v1/message:send
async fn rest_send_message<E: AgentExecutor>(
    State(state): State<AppState<E>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Task>, RestError> {
    let body = body.map_err(|rejection| body_rejection(rejection, state.config.max_body_size))?;
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| A2aError::parse_error(e.to_string()))?;
    let params = normalize::send_message_params(value)?;
    state
        .send_message(params)
        .await
        .map(Json)
        .map_err(|e| state.public_error(e).into())
}

/// Body that could not be buffered, usually because it is over `limit`
fn body_rejection(rejection: BytesRejection, limit: usize) -> A2aError {
    warn!(status = %rejection.status(), "Rejected request body");
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        A2aError::payload_too_large(limit)
    } else {
        A2aError::invalid_request(rejection.body_text())
    }
}

/// POST /a2a/rest/v1/message:stream
async fn rest_unsupported(uri: Uri) -> RestError {
    A2aError::unsupported(uri.path().trim_start_matches('/')).into()
}

/// GET /a2a/rest/v1/tasks/{id}
async fn rest_get_task<E: AgentExecutor>(
    State(state): State<AppState<E>>,
    Path(task_ref): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Task>, RestError> {
    if let Some((_, action)) = task_ref.rsplit_once(':') {
        return Err(match action {
            "subscribe" => A2aError::unsupported(format!("tasks/{task_ref}")),
            _ => A2aError::method_not_found(format!("GET tasks/{task_ref}")),
        }
        .into());
    }

    let history_length = query
        .get("historyLength")
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|e| A2aError::invalid_params(format!("historyLength: {e}")))
        })
        .transpose()?;

    let task = state
        .get_task(TaskQueryParams {
            id: task_ref,
            history_length,
        })
        .await?;
    Ok(Json(task))
}

/// POST /a2a/rest/v1/tasks/{id}:cancel and /tasks/{id}:subscribe
async fn rest_task_action<E: AgentExecutor>(
    State(state): State<AppState<E>>,
    Path(task_ref): Path<String>,
) -> Result<Json<Task>, RestError> {
    match task_ref.rsplit_once(':') {
        Some((task_id, "cancel")) if !task_id.is_empty() => {
            let task = state
                .cancel_task(TaskIdParams {
                    id: task_id.to_string(),
                    metadata: HashMap::new(),
                })
                .await?;
            Ok(Json(task))
        }
        Some((_, "subscribe")) => Err(A2aError::unsupported(format!("tasks/{task_ref}")).into()),
        _ => Err(A2aError::method_not_found(format!("POST tasks/{task_ref}")).into()),
    }
}

async fn not_found(uri: Uri) -> RestError {
    A2aError::method_not_found(uri.path()).into()
}

async fn method_not_allowed() -> Response {
    let body = ErrorResponse::new(codes::METHOD_NOT_FOUND, "Method not allowed");
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}

// =============================================================================
// Error Response
// =============================================================================

/// Wrapper for A2A errors on the REST binding
struct RestError(A2aError);

impl From<A2aError> for RestError {
    fn from(err: A2aError) -> Self {
        Self(err)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.0.http_status();
        let body: ErrorResponse = self.0.into();
        (status, Json(body)).into_response()
    }
}
