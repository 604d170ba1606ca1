use std::{error::Error as _, net::SocketAddr, sync::Arc};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        DefaultBodyLimit, Multipart, Query, Request, State,
    },
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::sync::Semaphore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::ServerCfg,
    error::ResizeError,
    params::{FormFields, ResizeRequest},
    post,
};

#[derive(Clone)]
pub struct AppState {
    jobs: Arc<Semaphore>,
    max_output_pixels: u64,
}

pub fn router(cfg: &ServerCfg) -> Router {
    let state = AppState {
        jobs: Arc::new(Semaphore::new(cfg.max_concurrent_jobs.max(1))),
        max_output_pixels: cfg.max_output_pixels,
    };

    Router::new()
        .route("/resize", post(resize).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(cfg: ServerCfg) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .context(format!("Failed to bind {}", cfg.bind))?;
    let addr = listener.local_addr()?;

    println!("{}", banner(addr));
    info!(
        max_upload_bytes = cfg.max_upload_bytes,
        max_concurrent_jobs = cfg.max_concurrent_jobs,
        max_output_pixels = cfg.max_output_pixels,
        "resize api ready"
    );

    axum::serve(listener, router(&cfg))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

/// The only line written to stdout; logs go to stderr.
fn banner(addr: SocketAddr) -> String {
    format!("Server listening on {addr}")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn method_not_allowed() -> ResizeError {
    ResizeError::MethodNotAllowed
}

async fn resize(
    State(st): State<AppState>,
    query: Result<Query<FormFields>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ResizeError> {
    let multipart = multipart.map_err(|e| ResizeError::MalformedMultipart(e.body_text()))?;
    let upload = read_form(multipart).await?;
    let file = upload.file.ok_or(ResizeError::MissingFile)?;

    // Query string only fills in fields the form left out.
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let req = ResizeRequest::from_fields(&upload.fields.or(query))?;
    req.check_output_size(st.max_output_pixels)?;

    debug!(
        bytes = file.len(),
        width = req.width,
        height = req.height,
        quality = req.quality,
        format = ?req.format,
        "resize requested"
    );

    let _permit = st
        .jobs
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ResizeError::Internal(e.to_string()))?;
    let encoded = tokio::task::spawn_blocking(move || post::process(&file, &req))
        .await
        .map_err(|e| ResizeError::Internal(e.to_string()))??;

    info!(bytes = encoded.bytes.len(), content_type = encoded.content_type, "resized");

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(encoded.content_type))],
        encoded.bytes,
    )
        .into_response())
}

#[derive(Default)]
struct Upload {
    file: Option<Bytes>,
    fields: FormFields,
}

/// Reads the whole form before any validation. Only a part carrying a
/// filename counts as the upload; text fields keep their first value.
async fn read_form(mut multipart: Multipart) -> Result<Upload, ResizeError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_owned();

        if field.file_name().is_some() {
            if name == "file" && upload.file.is_none() {
                upload.file = Some(field.bytes().await.map_err(malformed)?);
            }
            continue;
        }

        let slot = match name.as_str() {
            "width" => &mut upload.fields.width,
            "height" => &mut upload.fields.height,
            "quality" => &mut upload.fields.quality,
            "format" => &mut upload.fields.format,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(field.text().await.map_err(malformed)?);
        }
    }

    Ok(upload)
}

fn malformed(e: MultipartError) -> ResizeError {
    ResizeError::MalformedMultipart(e.body_text())
}

impl IntoResponse for ResizeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let cause = self.source().map(ToString::to_string);
        match &self {
            ResizeError::MalformedMultipart(detail) | ResizeError::Internal(detail) => {
                if status.is_server_error() {
                    error!(error = %self, %detail, "request failed");
                } else {
                    warn!(error = %self, %detail, "request rejected");
                }
            }
            _ if status.is_server_error() => error!(error = %self, ?cause, "request failed"),
            _ => warn!(error = %self, "request rejected"),
        }
        (status, self.to_string()).into_response()
    }
}
