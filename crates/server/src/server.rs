use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};
use uuid::Uuid;

use std::{net::SocketAddr, sync::Arc};

use crate::{accounts, commissions, documents, requests, services, tasks, wallet};
use engine::{Engine, EngineError};

static ACCOUNT_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-account-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the acting account
///
/// Identity is established upstream; every request must carry the
/// account id in "x-account-id".
#[derive(Debug)]
struct AccountHeader(Uuid);

impl Header for AccountHeader {
    fn name() -> &'static axum::http::HeaderName {
        &ACCOUNT_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = Uuid::parse_str(value.trim()) else {
            return Err(AxumError::invalid());
        };

        Ok(AccountHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-account-id header"),
        }
    }
}

async fn auth(
    account_header: Option<TypedHeader<AccountHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(AccountHeader(account_id))) = account_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let account = match state.engine.account(account_id).await {
        Ok(account) => account,
        Err(EngineError::KeyNotFound(_)) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            tracing::error!("failed to resolve acting account: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

/// Every route of the API, behind the account middleware.
pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };

    Router::new()
        .route("/accounts", post(accounts::account_new))
        .route("/accounts/{id}", get(accounts::get))
        .route("/agents", get(accounts::agents))
        .route("/agents/{id}/availability", patch(accounts::set_availability))
        .route(
            "/bank-accounts",
            get(accounts::bank_accounts).post(accounts::bank_account_new),
        )
        .route("/bank-accounts/{id}", delete(accounts::bank_account_remove))
        .route("/wallet", get(wallet::get))
        .route("/wallet/deposit", post(wallet::deposit))
        .route("/wallet/withdraw", post(wallet::withdraw))
        .route("/wallet/refund", post(wallet::refund))
        .route("/wallet/audit", get(wallet::audit))
        .route("/services", get(services::list).post(services::service_new))
        .route(
            "/services/{id}",
            patch(services::update).delete(services::remove),
        )
        .route("/bookings", post(requests::booking_new))
        .route("/leads", post(requests::lead_new))
        .route("/requests/{id}", get(requests::get))
        .route("/tasks", get(tasks::list))
        .route("/tasks/{id}", get(tasks::get))
        .route("/tasks/{id}/assign", post(tasks::assign))
        .route("/tasks/{id}/accept", post(tasks::accept))
        .route("/tasks/{id}/reject", post(tasks::reject))
        .route("/tasks/{id}/request-docs", post(tasks::request_docs))
        .route("/tasks/{id}/supply-docs", post(tasks::supply_docs))
        .route("/tasks/{id}/ack", post(tasks::ack))
        .route("/tasks/{id}/complete", post(tasks::complete))
        .route(
            "/tasks/{id}/commission/approve",
            post(commissions::approve),
        )
        .route("/tasks/{id}/commission/reject", post(commissions::reject))
        .route("/commissions", get(commissions::list))
        .route("/documents", get(documents::get))
        .route("/admin/reset", post(requests::reset))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}
