use super::*;
use crate::ID;
use crate::gameroom::Session;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;

pub struct Server;

impl Server {
    pub async fn run(settings: Settings) -> anyhow::Result<()> {
        let casino = Casino::new(settings.inference()?, settings.defaults()).with_trace(settings.trace().await?);
        let casino = web::Data::new(casino);
        let state = casino.clone();
        log::info!("[server] listening on {}:{}", settings.host, settings.port);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(state.clone())
                .route("/api/sessions", web::post().to(create))
                .route("/api/sessions/{id}", web::get().to(status))
                .route("/api/sessions/{id}", web::delete().to(remove))
                .route("/api/models", web::get().to(models))
                .route("/api/health", web::get().to(health))
                .route("/ws/{id}", web::get().to(enter))
        })
        .workers(settings.workers)
        .bind(settings.bind())?
        .run()
        .await?;
        casino.close_all().await;
        Ok(())
    }
}

fn missing(id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": format!("session {} not found", id) }))
}

async fn lookup(casino: &Casino, id: &str) -> Option<std::sync::Arc<Session>> {
    match ID::try_from(id) {
        Ok(id) => casino.get(id).await,
        Err(_) => None,
    }
}

async fn create(casino: web::Data<Casino>, body: web::Json<CreateSession>) -> impl Responder {
    let body = body.into_inner();
    let config = body.config(casino.defaults());
    match casino.create(&body.opponents, config).await {
        Ok(session) => HttpResponse::Ok().json(Created {
            session_id: session.id().to_string(),
            websocket_url: format!("/ws/{}", session.id()),
            players: session.snapshot().players,
        }),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

async fn status(casino: web::Data<Casino>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match lookup(&casino, &id).await {
        Some(session) => {
            let state = session.snapshot();
            HttpResponse::Ok().json(Summary {
                session_id: id,
                status: session.status(),
                hand_number: state.hand_number,
                stacks: state.players.iter().map(|p| p.stack).collect(),
                connections: session.connections().count().await,
            })
        }
        None => missing(&id),
    }
}

async fn remove(casino: web::Data<Casino>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match ID::try_from(id.as_str()) {
        Ok(key) => match casino.remove(key).await {
            Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "deleted" })),
            Err(_) => missing(&id),
        },
        Err(_) => missing(&id),
    }
}

async fn models(casino: web::Data<Casino>) -> impl Responder {
    match casino.inference().models().await {
        Ok(models) => HttpResponse::Ok().json(Models { models }),
        Err(e) => {
            log::warn!("[server] listing models failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

async fn health(casino: web::Data<Casino>) -> impl Responder {
    let inference = casino.inference().healthy().await;
    HttpResponse::Ok().json(Health {
        status: if inference { "healthy" } else { "degraded" },
        inference,
        sessions: casino.count().await,
    })
}

async fn enter(
    casino: web::Data<Casino>,
    path: web::Path<String>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let id = path.into_inner();
    let Ok(key) = ID::<Session>::try_from(id.as_str()) else {
        return missing(&id).map_into_right_body();
    };
    match actix_ws::handle(&req, body) {
        Ok((response, ws, stream)) => match casino.bridge(key, ws, stream).await {
            Ok(()) => response.map_into_left_body(),
            Err(e) => HttpResponse::NotFound()
                .body(e.to_string())
                .map_into_right_body(),
        },
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
