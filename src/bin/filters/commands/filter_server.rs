//! Runs a local server so a web UI can build filters for the current dataset.
//!
//! The UI gets the operator tables from here, and sends back what the user typed or built.
use crate::args::ServeParams;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusty_filters::context::Dataset;
use rusty_filters::{
    applicable_filters, operators_for_type, parse_filters, ColumnRegistry, ColumnType, Error,
    ErrorKind, FilterCondition, FilterOperator, InternalError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Builder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct OperatorInfo {
    operator: FilterOperator,
    label: &'static str,
    requires_value: bool,
    accepts_multiple: bool,
}

#[derive(Debug, Deserialize)]
struct ApplyRequest {
    filters: Vec<FilterCondition>,
}

#[derive(Debug, Deserialize)]
struct ParseRequest {
    input: String,
}

/// Read once when the server starts. Switching datasets means restarting the server.
struct ServerState {
    columns: ColumnRegistry,
}

type ErrorResponse = (StatusCode, String);

pub fn run(params: ServeParams) -> Result<(), Error> {
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish())
        .map_err(|error| InternalError(format!("Cannot set up request logging: {error}")))?;

    // a single thread is plenty for one browser tab
    let tokio = Builder::new_current_thread().enable_io().build()?;

    let allowed_origin = params
        .allow_origin
        .parse::<HeaderValue>()
        .map_err(|_| InternalError(format!("Invalid origin: {}", params.allow_origin)))?;

    let dataset = Dataset::current()?;
    info!("serving filters for dataset {}", dataset.name);

    let state = Arc::new(ServerState {
        columns: dataset.columns(),
    });

    let app = Router::new()
        .route("/api/v1/operators/:column_type", get(operators))
        .route("/api/v1/filters/apply", post(apply))
        .route("/api/v1/filters/parse", post(parse))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origin)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST]),
        );

    tokio.block_on(async {
        let listener = tokio::net::TcpListener::bind(params.listen.as_str()).await?;
        info!("listening on {}", params.listen);

        axum::serve(listener, app).await?;

        Ok::<(), Error>(())
    })
}

async fn operators(Path(column_type): Path<ColumnType>) -> Json<Vec<OperatorInfo>> {
    debug!("operators for {column_type}");

    Json(
        operators_for_type(column_type)
            .iter()
            .map(|&operator| OperatorInfo {
                operator,
                label: operator.label(),
                requires_value: operator.requires_value(),
                accepts_multiple: operator.accepts_multiple(),
            })
            .collect(),
    )
}

async fn apply(Json(request): Json<ApplyRequest>) -> Json<Vec<FilterCondition>> {
    let applied = applicable_filters(&request.filters);
    info!(
        "applying {} of {} filters",
        applied.len(),
        request.filters.len()
    );

    Json(applied)
}

async fn parse(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<Vec<FilterCondition>>, ErrorResponse> {
    match parse_filters(request.input.as_str(), &state.columns) {
        Ok(filters) => Ok(Json(filters)),
        Err(error) => match error.kind() {
            ErrorKind::SyntaxError(_) | ErrorKind::FilterSyntaxError(_) => {
                debug!("rejecting filter input: {error}");
                Err((StatusCode::BAD_REQUEST, error.to_string()))
            }
            _ => Err(internal_error(error)),
        },
    }
}

fn internal_error(error: Error) -> ErrorResponse {
    warn!("{error}");

    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_filters::{ColumnDefinition, FilterValue};

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn state() -> State<Arc<ServerState>> {
        State(Arc::new(ServerState {
            columns: ColumnRegistry::new(vec![
                ColumnDefinition::new("status", "Status", ColumnType::String),
                ColumnDefinition::new("latency", "Latency", ColumnType::Duration),
            ]),
        }))
    }

    fn parse_request(input: &str) -> Json<ParseRequest> {
        Json(ParseRequest {
            input: input.to_string(),
        })
    }

    #[test]
    fn test_operators() {
        let Json(operators) = block_on(operators(Path(ColumnType::Json)));

        assert_eq!(operators.len(), 2);
        assert_eq!(operators[0].operator, FilterOperator::Exists);
        assert!(!operators[0].requires_value);
    }

    #[test]
    fn test_apply_keeps_well_formed_filters() {
        let request: ApplyRequest = serde_json::from_str(
            r#"{"filters": [
                {"id": "1", "column": "status", "operator": "=", "value": "active"},
                {"id": "2", "column": "status", "operator": "IN", "value": []},
                {"id": "3", "column": "", "operator": "EXISTS", "value": null}
            ]}"#,
        )
        .unwrap();

        let Json(applied) = block_on(apply(Json(request)));

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].id.as_str(), "1");
    }

    #[test]
    fn test_parse() {
        let Json(filters) = block_on(parse(state(), parse_request("latency > 1e3"))).unwrap();

        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].value, FilterValue::number(1000.0));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["status =", "nope = 1", "latency CONTAINS 1"] {
            let result = block_on(parse(state(), parse_request(input)));

            match result {
                Err((status, message)) => {
                    assert_eq!(status, StatusCode::BAD_REQUEST, "{input}");
                    assert!(!message.is_empty());
                }
                Ok(_) => panic!("{input} should not parse"),
            }
        }
    }
}
