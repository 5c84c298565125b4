mod error;
mod handler;

use std::{error::Error, net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, put},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use kaigi::{
    domain::core::{ReservationRegistry, ReservationRepository},
    infrastructure::core::JsonFileReservationRepository,
    KaigiConfig,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() {
    match KaigiConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = serve(&config).await {
                error!("アプリケーションエラー: {}", error);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("設定の読み込みに失敗しました: {}", error)
        }
    }
}

async fn serve(config: &KaigiConfig) -> Result<(), Box<dyn Error>> {
    let address = config.server.address.parse::<SocketAddr>()?;
    let repository = JsonFileReservationRepository::new(&config.storage.path);
    info!("予約の保存先: {}", repository.path().display());
    let app = router(Arc::new(ReservationRegistry::init(repository).await));

    match &config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!("HTTPSで待ち受けます: {}", address);
            axum_server::bind_rustls(address, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("HTTPで待ち受けます: {}", address);
            axum_server::bind(address)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}

fn router<R: ReservationRepository + 'static>(registry: Arc<ReservationRegistry<R>>) -> Router {
    Router::new()
        .route(
            "/api/reservations",
            get(handler::list::<R>).post(handler::create::<R>),
        )
        .route(
            "/api/reservations/:id",
            put(handler::update::<R>).delete(handler::delete::<R>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}
