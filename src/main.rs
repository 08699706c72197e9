use nfe_import::{api, create_pool, run_migrations, AppConfig};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 读取 .env (可选)
    dotenvy::dotenv().ok();

    // 加载配置
    let config = AppConfig::from_env()?;

    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_max_level(config.log_level())
        .with_target(true)
        .with_level(true)
        .init();

    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池 (每次导入借用一个连接)
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    if config.database.run_migrations {
        run_migrations(&pool).await?;
        info!("Database migrations applied");
    }

    let app = api::router(pool, config.server.max_upload_bytes);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health");
    info!("  POST /read_xml                     - parse NF-e only");
    info!("  POST /insert_xml                   - parse and import NF-e");
    info!("  GET  /orders?owner_entity_id=N");
    info!("  GET  /orders/:order_id/items[.csv]");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
