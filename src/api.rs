use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Extension, Multipart, State},
    http::{header, HeaderName, Request, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::messages::{generation_failed, EXPORT_FILE_NAME, IMAGE_REQUIRED, TITLE_REQUIRED};
use crate::service::{DescriptionService, UpstreamError};
use crate::store::ImageInput;

pub mod page;

use page::Outcome;

/// Largest accepted request body; uploads are whole images.
pub const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct DescribeRequest {
    image_url: String,
    title: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone, Debug)]
struct RequestContext {
    request_id: String,
}

#[derive(Debug, Default)]
struct DescribeForm {
    image_url: String,
    title: String,
    file: Option<(String, Vec<u8>)>,
}

pub fn router(service: DescriptionService) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/describe", post(describe_form))
        .route("/api/history", get(get_history))
        .route("/api/history.csv", get(download_csv))
        .route("/api/describe", post(describe_json))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .layer(middleware::from_fn(assign_request_id))
        .with_state(service)
}

pub async fn serve(addr: SocketAddr, service: DescriptionService) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Serving web form");
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn index(State(service): State<DescriptionService>) -> Html<String> {
    let records = service.records().await;
    Html(page::render(&records, None))
}

async fn describe_form(
    State(service): State<DescriptionService>,
    Extension(request): Extension<RequestContext>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(err) => {
            tracing::debug!(request_id = %request.request_id, error = %err, "Rejected form upload");
            let records = service.records().await;
            let outcome = Outcome::Failed(err.body_text());
            return (StatusCode::BAD_REQUEST, Html(page::render(&records, Some(&outcome))))
                .into_response();
        }
    };

    if form.title.trim().is_empty() {
        let records = service.records().await;
        let outcome = Outcome::Failed(TITLE_REQUIRED.to_string());
        return (StatusCode::BAD_REQUEST, Html(page::render(&records, Some(&outcome))))
            .into_response();
    }

    let outcome = match form_image(&service, form.file, form.image_url).await {
        Ok(image) => match service.generate(image, &form.title).await {
            Ok(record) => Outcome::Generated(record),
            Err(err) => {
                tracing::warn!(request_id = %request.request_id, error = %err, "Form generation failed");
                Outcome::Failed(generation_failed(&err))
            }
        },
        Err(err) => {
            tracing::error!(request_id = %request.request_id, error = %err, "Failed to store upload");
            Outcome::Failed(generation_failed(&err))
        }
    };

    let records = service.records().await;
    Html(page::render(&records, Some(&outcome))).into_response()
}

/// An uploaded file wins over the URL field.
async fn form_image(
    service: &DescriptionService,
    file: Option<(String, Vec<u8>)>,
    image_url: String,
) -> Result<ImageInput> {
    match file {
        Some((name, bytes)) => service.store_upload(&name, bytes).await,
        None => Ok(ImageInput::Url(image_url)),
    }
}

async fn read_form(mut multipart: Multipart) -> Result<DescribeForm, MultipartError> {
    let mut form = DescribeForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image_url" => form.image_url = field.text().await?,
            "title" => form.title = field.text().await?,
            "image_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.file = Some((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn get_history(
    State(service): State<DescriptionService>,
    Extension(request): Extension<RequestContext>,
) -> Response {
    let records = service.records().await;
    tracing::debug!(request_id = %request.request_id, rows = records.len(), "Read history");
    (StatusCode::OK, Json(records)).into_response()
}

async fn download_csv(
    State(service): State<DescriptionService>,
    Extension(request): Extension<RequestContext>,
) -> Response {
    let bytes = match service.export_csv().await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(request_id = %request.request_id, error = %err, "Failed to export history");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "export failed".into());
        }
    };
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn describe_json(
    State(service): State<DescriptionService>,
    Extension(request): Extension<RequestContext>,
    Json(payload): Json<DescribeRequest>,
) -> Response {
    if payload.title.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, TITLE_REQUIRED.into());
    }
    if payload.image_url.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, IMAGE_REQUIRED.into());
    }

    match service
        .generate(ImageInput::Url(payload.image_url), &payload.title)
        .await
    {
        Ok(record) => {
            tracing::debug!(request_id = %request.request_id, title = %record.title, "Generated description via API");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(err) => {
            let status = if err.is::<UpstreamError>() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            tracing::warn!(request_id = %request.request_id, %status, error = %err, "API generation failed");
            error_response(status, format!("{err:#}"))
        }
    }
}

async fn assign_request_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });
    let method = req.method().clone();
    let uri = req.uri().clone();
    let mut response = next.run(req).await;
    let status = response.status();
    if let Ok(value) = request_id.parse() {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), value);
    }
    tracing::debug!(
        request_id,
        method = %method,
        uri = %uri,
        status = %status,
        "Web request completed"
    );
    response
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
