use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use mentora_server::{app_state::AppState, config::Config, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        config.validate_for_production();
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let state = AppState::new(config)
        .await
        .expect("failed to initialise application state");

    log::info!("starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(handlers::health_check)
            .service(handlers::list_templates)
            .service(handlers::get_template)
            .service(handlers::save_template)
            .service(handlers::publish_template)
            .service(handlers::delete_template)
            .service(handlers::get_course_content)
            .service(handlers::add_test_item)
            .service(handlers::remove_item)
            .service(handlers::move_item)
            .service(handlers::create_block)
            .service(handlers::update_block)
            .service(handlers::delete_block)
            .service(handlers::move_block)
            .service(handlers::delete_course_content)
            .service(handlers::submit_attempt)
            .service(handlers::get_attempts)
            .service(handlers::latest_attempts)
            .service(handlers::best_attempts)
            .service(handlers::course_progress)
            .service(handlers::knowledge_progress)
            .service(handlers::load_session)
            .service(handlers::save_session)
            .service(handlers::clear_session)
    })
    .bind((host, port))?
    .run()
    .await
}
