mod error;

use actix_cors::Cors;
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::{AuthUseCase, CleanFileUseCase, CleaningOutcome};
use crate::domain::csv::{OperationFlag, OperationSet};
use crate::domain::error::{AppError, Result};
use crate::domain::history::HistoryRecord;
use crate::domain::user::Credentials;
use crate::infrastructure::session_store::{CleanedArtifact, SessionStore};

pub struct HttpState {
    pub auth: AuthUseCase,
    pub cleaner: CleanFileUseCase,
    pub sessions: SessionStore,
}

#[derive(Deserialize)]
pub struct CleanQuery {
    pub filename: String,
    /// Comma-separated operation keys
    #[serde(default)]
    pub operations: String,
}

#[derive(Serialize)]
pub struct CleanResponse {
    #[serde(flatten)]
    pub outcome: CleaningOutcome,
    pub original_preview_html: String,
    pub cleaned_preview_html: String,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub backend: &'static str,
    pub records: Vec<HistoryRecord>,
}

#[derive(Serialize)]
pub struct OperationInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub checked_by_default: bool,
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(req: &HttpRequest) -> Result<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Please log in".to_string()))
}

#[post("/register")]
async fn register(
    data: web::Data<HttpState>,
    req: web::Json<Credentials>,
) -> Result<HttpResponse> {
    let user = data.auth.register(&req).await?;
    Ok(HttpResponse::Created().json(user))
}

#[post("/login")]
async fn login(data: web::Data<HttpState>, req: web::Json<Credentials>) -> Result<HttpResponse> {
    let result = data.auth.login(&req).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/logout")]
async fn logout(data: web::Data<HttpState>, req: HttpRequest) -> Result<HttpResponse> {
    let token = bearer_token(&req)?;
    data.auth.logout(&token)?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/me")]
async fn me(data: web::Data<HttpState>, req: HttpRequest) -> Result<HttpResponse> {
    let session = data.sessions.get(&bearer_token(&req)?)?;
    Ok(HttpResponse::Ok().json(session))
}

#[get("/operations")]
async fn operations() -> HttpResponse {
    let ops: Vec<OperationInfo> = OperationFlag::ALL
        .iter()
        .map(|op| OperationInfo {
            key: op.key(),
            name: op.display_name(),
            checked_by_default: op.checked_by_default(),
        })
        .collect();
    HttpResponse::Ok().json(ops)
}

#[post("/clean")]
async fn clean_file(
    data: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<CleanQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let token = bearer_token(&req)?;
    let session = data.sessions.get(&token)?;
    let selected = OperationSet::parse_keys(&query.operations)?;

    info!(
        user_id = session.user_id,
        filename = %query.filename,
        bytes = body.len(),
        operations = selected.len(),
        "Cleaning upload"
    );

    let outcome = data
        .cleaner
        .execute(session.user_id, &query.filename, &body, &selected)
        .await?;

    data.sessions.store_cleaned(
        &token,
        CleanedArtifact {
            filename: outcome.filename.clone(),
            csv: outcome.cleaned_csv.clone(),
        },
    )?;

    Ok(HttpResponse::Ok().json(CleanResponse {
        original_preview_html: outcome.original_preview.to_html(),
        cleaned_preview_html: outcome.cleaned_preview.to_html(),
        outcome,
    }))
}

#[get("/download")]
async fn download(data: web::Data<HttpState>, req: HttpRequest) -> Result<HttpResponse> {
    let artifact = data.sessions.cleaned(&bearer_token(&req)?)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(artifact.download_name())],
        })
        .body(artifact.csv))
}

#[get("/history")]
async fn history(data: web::Data<HttpState>, req: HttpRequest) -> Result<HttpResponse> {
    let session = data.sessions.get(&bearer_token(&req)?)?;
    let records = data.cleaner.history(session.user_id).await?;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        backend: data.cleaner.backend_name(),
        records,
    }))
}

/// Register the API routes and the upload size limit
pub fn configure(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.app_data(web::PayloadConfig::new(max_upload_bytes))
        .service(
            web::scope("/api")
                .service(register)
                .service(login)
                .service(logout)
                .service(me)
                .service(operations)
                .service(clean_file)
                .service(download)
                .service(history),
        );
}

pub fn start_server(
    state: HttpState,
    host: &str,
    port: u16,
    max_upload_bytes: usize,
) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, max_upload_bytes))
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
